//! Demographic profiles over customer id ranges

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::Value;
use crate::engine::QueryPlan;
use crate::plan::{col, lit, AggregateExpr, Aggregation, Expr, JoinType};
use super::columns::{CID, GROSS_SPEND, QUANTITY, SALES_PRICE};
use super::datasets::{CONTACTS, SALES};
use super::{scalar_f64, scalar_i64, ProfileAggregator, ProfileError};

/// Contact fields a group profile is broken down by
pub const DEMOGRAPHIC_FIELDS: [&str; 3] = ["gender", "city", "loyalty_customer"];

/// Label used for null demographic values
const UNKNOWN: &str = "unknown";

/// Number of customers sharing one value of a demographic field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBucket {
    pub value: String,
    pub count: i64,
}

/// Aggregate view of the customers in an id range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupProfile {
    pub start: i64,
    pub end: i64,
    pub total_users: i64,
    /// Per field, buckets in order of first appearance
    pub distributions: BTreeMap<String, Vec<DistributionBucket>>,
    /// Mean of each purchasing customer's own mean gross spend;
    /// `None` when nobody in the range has a sale
    pub avg_spend: Option<f64>,
}

impl ProfileAggregator {
    /// Profile customers whose id lies in `[start, end]`.
    ///
    /// Fails with `EmptyGroup` when the range matches no customer.
    pub fn group_profile(&self, start: i64, end: i64) -> Result<GroupProfile, ProfileError> {
        let engine = self.engine();
        let members = engine.scan(CONTACTS, Some(in_range(start, end)))?;

        let totals = engine.aggregate(&members, &[], vec![AggregateExpr::count_rows("total_users")])?;
        let total_users = scalar_i64(&engine.materialize(&totals)?, "total_users").unwrap_or(0);
        if total_users == 0 {
            tracing::debug!(start, end, "group profile matched no customers");
            return Err(ProfileError::EmptyGroup { start, end });
        }

        let mut distributions = BTreeMap::new();
        for field in DEMOGRAPHIC_FIELDS {
            let plan = engine.aggregate(&members, &[field], vec![AggregateExpr::count_rows("users")])?;
            let result = engine.materialize(&plan)?;
            let buckets = result
                .rows()
                .iter()
                .map(|row| DistributionBucket {
                    value: match &row[0] {
                        Value::Null => UNKNOWN.to_string(),
                        v => v.to_string(),
                    },
                    count: match row[1] {
                        Value::Int(n) => n,
                        _ => 0,
                    },
                })
                .collect();
            distributions.insert(field.to_string(), buckets);
        }

        let spend = engine.materialize(&self.group_spend_plan(&members, start, end)?)?;
        let avg_spend = scalar_f64(&spend, "avg_spend");

        Ok(GroupProfile {
            start,
            end,
            total_users,
            distributions,
            avg_spend,
        })
    }

    /// Per-customer mean spend, averaged across the group's purchasing members
    fn group_spend_plan(
        &self,
        members: &QueryPlan,
        start: i64,
        end: i64,
    ) -> Result<QueryPlan, ProfileError> {
        let engine = self.engine();
        let ids = engine.project(members, &[CID])?;
        let sales = engine.scan(SALES, Some(in_range(start, end)))?;
        let sales = engine.join(&sales, &ids, CID, JoinType::Inner)?;
        let sales = engine.with_derived(&sales, GROSS_SPEND, col(QUANTITY).mul(col(SALES_PRICE)))?;

        let per_customer = engine.aggregate(
            &sales,
            &[CID],
            vec![AggregateExpr::new(Aggregation::Mean, col(GROSS_SPEND), "customer_avg")],
        )?;
        Ok(engine.aggregate(
            &per_customer,
            &[],
            vec![AggregateExpr::new(Aggregation::Mean, col("customer_avg"), "avg_spend")],
        )?)
    }
}

fn in_range(start: i64, end: i64) -> Expr {
    col(CID).between(lit(start), lit(end))
}
