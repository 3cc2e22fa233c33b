//! Shopping habits derived from transaction dates and categories

use serde::Serialize;

use crate::engine::QueryError;
use crate::plan::{col, AggregateExpr, Aggregation};
use super::columns::{ITEM_CATEGORY, SALES_DATE};
use super::{scalar_i64, scalar_string, ProfileAggregator, ProfileError};

const DAY_OF_WEEK: &str = "day_of_week";

/// When a customer shops most and what they buy most
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingHabits {
    /// Most frequent weekday; `None` if no sale date parses
    pub peak_day: Option<String>,
    /// Most frequent product category; `None` if no sold item is catalogued
    pub top_category: Option<String>,
}

impl ProfileAggregator {
    /// Most frequent weekday and product category for one customer.
    ///
    /// Ties resolve to the value seen first in transaction order. Fails with
    /// `EmptyResult` when the customer has no transactions.
    pub fn peak_day_and_top_category(&self, customer_id: &str) -> Result<ShoppingHabits, ProfileError> {
        let engine = self.engine();
        let digest = self.transaction_digest_plan(customer_id)?;
        let dated = engine.with_derived(&digest, DAY_OF_WEEK, col(SALES_DATE).day_of_week())?;
        let plan = engine.aggregate(
            &dated,
            &[],
            vec![
                AggregateExpr::count_rows("transactions"),
                AggregateExpr::new(Aggregation::Mode, col(DAY_OF_WEEK), "peak_day"),
                AggregateExpr::new(Aggregation::Mode, col(ITEM_CATEGORY), "top_category"),
            ],
        )?;
        let result = engine.materialize(&plan)?;

        if scalar_i64(&result, "transactions").unwrap_or(0) == 0 {
            return Err(QueryError::EmptyResult(format!(
                "transaction history for customer '{}'",
                customer_id
            ))
            .into());
        }

        Ok(ShoppingHabits {
            peak_day: scalar_string(&result, "peak_day"),
            top_category: scalar_string(&result, "top_category"),
        })
    }
}
