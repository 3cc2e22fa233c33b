//! Per-customer transaction digests

use serde::Serialize;

use crate::engine::{MaterializedResult, QueryError, QueryPlan};
use crate::plan::{col, lit, AggregateExpr, Aggregation, JoinType, SortKey};
use super::columns::*;
use super::datasets::{CONTACTS, SALES, SKU};
use super::{scalar_f64, scalar_i64, ProfileAggregator, ProfileError};

const SALES_COLUMNS: [&str; 7] = [CID, SALES_ID, SALES_DATE, QUANTITY, SALES_PRICE, DISCOUNT, ITEM_SID];
const CATALOG_COLUMNS: [&str; 5] = [ITEM_SID, DESCRIPTION, ITEM_CATEGORY, VENDOR_CODE, DEPARTMENT_CODE];
const CONTACT_COLUMNS: [&str; 6] = [CID, "first_name", "last_name", "gender", "city", "loyalty_customer"];

/// Spend totals for one customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendSummary {
    pub transactions: i64,
    pub total_spend: f64,
    /// Mean gross spend per transaction; `None` without transactions
    pub avg_spend: Option<f64>,
    pub total_discount: f64,
}

impl ProfileAggregator {
    /// Sales rows for one customer joined with catalogue metadata, with
    /// `gross_spend = quantity * sales_price` and
    /// `discount_value = quantity * discount`.
    ///
    /// Sales whose item is missing from the catalogue are kept with null
    /// metadata.
    pub fn transaction_digest_plan(&self, customer_id: &str) -> Result<QueryPlan, QueryError> {
        let engine = self.engine();
        let sales = engine.scan(SALES, Some(col(CID).eq(lit(customer_id))))?;
        let sales = engine.project(&sales, &SALES_COLUMNS)?;
        let catalog = engine.project(&engine.scan(SKU, None)?, &CATALOG_COLUMNS)?;

        let enriched = engine.join(&sales, &catalog, ITEM_SID, JoinType::Left)?;
        let enriched = engine.with_derived(&enriched, GROSS_SPEND, col(QUANTITY).mul(col(SALES_PRICE)))?;
        engine.with_derived(&enriched, DISCOUNT_VALUE, col(QUANTITY).mul(col(DISCOUNT)))
    }

    /// Materialized transaction digest. Unknown customers yield an empty
    /// result, not an error.
    pub fn transaction_digest(&self, customer_id: &str) -> Result<MaterializedResult, ProfileError> {
        let plan = self.transaction_digest_plan(customer_id)?;
        Ok(self.engine().materialize(&plan)?)
    }

    /// Contact record(s) for one customer
    pub fn customer_profile(&self, customer_id: &str) -> Result<MaterializedResult, ProfileError> {
        let plan = self
            .engine()
            .scan(CONTACTS, Some(col(CID).eq(lit(customer_id))))?;
        Ok(self.engine().materialize(&plan)?)
    }

    /// Transaction digest enriched with the customer's contact fields
    pub fn user_analytics(&self, customer_id: &str) -> Result<MaterializedResult, ProfileError> {
        let engine = self.engine();
        let digest = self.transaction_digest_plan(customer_id)?;
        let contact = engine.scan(CONTACTS, Some(col(CID).eq(lit(customer_id))))?;
        let contact = engine.project(&contact, &CONTACT_COLUMNS)?;
        let plan = engine.join(&digest, &contact, CID, JoinType::Left)?;
        Ok(engine.materialize(&plan)?)
    }

    /// Sales of known customers only, joined with their contact fields and
    /// ordered by sale date. Narrowed to one customer when an id is given.
    pub fn sales_history(&self, customer_id: Option<&str>) -> Result<MaterializedResult, ProfileError> {
        let engine = self.engine();
        let sales = engine.scan(SALES, customer_id.map(|id| col(CID).eq(lit(id))))?;
        let sales = engine.project(&sales, &SALES_COLUMNS)?;
        let contacts = engine.project(&engine.scan(CONTACTS, None)?, &CONTACT_COLUMNS)?;
        let history = engine.join(&sales, &contacts, CID, JoinType::Inner)?;
        let plan = engine.sort(&history, vec![SortKey::asc(SALES_DATE), SortKey::asc(SALES_ID)])?;
        Ok(engine.materialize(&plan)?)
    }

    /// Transaction count and spend totals for one customer
    pub fn spend_summary(&self, customer_id: &str) -> Result<SpendSummary, ProfileError> {
        let engine = self.engine();
        let digest = self.transaction_digest_plan(customer_id)?;
        let plan = engine.aggregate(
            &digest,
            &[],
            vec![
                AggregateExpr::count_rows("transactions"),
                AggregateExpr::new(Aggregation::Sum, col(GROSS_SPEND), "total_spend"),
                AggregateExpr::new(Aggregation::Mean, col(GROSS_SPEND), "avg_spend"),
                AggregateExpr::new(Aggregation::Sum, col(DISCOUNT_VALUE), "total_discount"),
            ],
        )?;
        let result = engine.materialize(&plan)?;

        Ok(SpendSummary {
            transactions: scalar_i64(&result, "transactions").unwrap_or(0),
            total_spend: scalar_f64(&result, "total_spend").unwrap_or(0.0),
            avg_spend: scalar_f64(&result, "avg_spend"),
            total_discount: scalar_f64(&result, "total_discount").unwrap_or(0.0),
        })
    }

    /// Catalogue items in one category, most expensive first
    pub fn category_catalog(&self, category: &str) -> Result<MaterializedResult, ProfileError> {
        let engine = self.engine();
        let items = engine.scan(SKU, Some(col(ITEM_CATEGORY).eq(lit(category))))?;
        let items = engine.project(&items, &[ITEM_SID, DESCRIPTION, ITEM_CATEGORY, LIST_PRICE])?;
        let plan = engine.sort(&items, vec![SortKey::desc(LIST_PRICE), SortKey::asc(DESCRIPTION)])?;
        Ok(engine.materialize(&plan)?)
    }
}
