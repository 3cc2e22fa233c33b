//! Profile aggregator (verb module)
//!
//! Derived summaries built from query plans: per-customer transaction
//! digests, demographic group profiles, the campaign leaderboard and
//! shopping habits.

mod campaign;
mod digest;
mod error;
mod group;
mod habits;

use crate::dataset::Value;
use crate::engine::{MaterializedResult, QueryEngine};

pub use digest::SpendSummary;
pub use error::ProfileError;
pub use group::{DistributionBucket, GroupProfile, DEMOGRAPHIC_FIELDS};
pub use habits::ShoppingHabits;

/// Logical dataset names
pub mod datasets {
    pub const SALES: &str = "sales";
    pub const CONTACTS: &str = "contacts";
    pub const SKU: &str = "sku";
    pub const CAMPAIGN_METRICS: &str = "campaign_metrics";

    /// Datasets every profile operation may touch
    pub const REQUIRED: [&str; 4] = [SALES, CONTACTS, SKU, CAMPAIGN_METRICS];
}

/// Column names shared across summaries
pub mod columns {
    pub const CID: &str = "cid";
    pub const SALES_ID: &str = "sales_id";
    pub const SALES_DATE: &str = "sales_date";
    pub const QUANTITY: &str = "quantity";
    pub const SALES_PRICE: &str = "sales_price";
    pub const DISCOUNT: &str = "discount";
    pub const ITEM_SID: &str = "item_sid";
    pub const DESCRIPTION: &str = "description";
    pub const ITEM_CATEGORY: &str = "item_category";
    pub const LIST_PRICE: &str = "list_price";
    pub const VENDOR_CODE: &str = "vendor_code";
    pub const DEPARTMENT_CODE: &str = "department_code";
    pub const CAMPAIGN_ID: &str = "campaign_id";
    pub const TEMPLATE_ID: &str = "template_id";
    pub const EVENT_TYPE: &str = "event_type";

    pub const GROSS_SPEND: &str = "gross_spend";
    pub const DISCOUNT_VALUE: &str = "discount_value";
    pub const CLICKED: &str = "clicked";
    pub const DELIVERED: &str = "delivered";
    pub const SUCCESS_RATE: &str = "success_rate";
}

/// Builds summaries on top of the query engine
#[derive(Debug, Clone)]
pub struct ProfileAggregator {
    engine: QueryEngine,
}

impl ProfileAggregator {
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }
}

fn first_value<'a>(result: &'a MaterializedResult, column: &str) -> Option<&'a Value> {
    result.value(0, column).filter(|v| !v.is_null())
}

fn scalar_f64(result: &MaterializedResult, column: &str) -> Option<f64> {
    first_value(result, column).and_then(Value::as_f64)
}

fn scalar_i64(result: &MaterializedResult, column: &str) -> Option<i64> {
    match first_value(result, column)? {
        Value::Int(i) => Some(*i),
        _ => None,
    }
}

fn scalar_string(result: &MaterializedResult, column: &str) -> Option<String> {
    first_value(result, column).map(|v| v.to_string())
}
