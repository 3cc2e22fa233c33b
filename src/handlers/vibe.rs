//! Vibe report: behavioural and purchase metrics for one customer

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::dispatch::{RequestEnvelope, Route};
use crate::engine::QueryError;
use crate::profile::{ProfileAggregator, ProfileError, ShoppingHabits};
use super::generator::{enrich, Generator};
use super::{Handler, HandlerError};

pub struct VibeReportHandler {
    profiles: Arc<ProfileAggregator>,
    generator: Option<Arc<dyn Generator>>,
}

impl VibeReportHandler {
    pub fn new(profiles: Arc<ProfileAggregator>, generator: Option<Arc<dyn Generator>>) -> Self {
        Self { profiles, generator }
    }
}

#[async_trait]
impl Handler for VibeReportHandler {
    async fn handle(&self, envelope: &RequestEnvelope) -> Result<Map<String, Value>, HandlerError> {
        let user_id = envelope.require_identifier("user_id")?;
        let summary = self.profiles.spend_summary(&user_id)?;
        let habits = optional_habits(&self.profiles, &user_id)?;

        let result = json!({
            "user_id": user_id,
            "behavioral_metrics": {
                "transactions": summary.transactions,
                "total_spend": summary.total_spend,
                "avg_order_value": summary.avg_spend,
                "total_discount": summary.total_discount,
            },
            "purchase_metrics": {
                "peak_day": habits.as_ref().and_then(|h| h.peak_day.clone()),
                "top_category": habits.as_ref().and_then(|h| h.top_category.clone()),
            },
        });
        let Value::Object(result) = result else {
            return Err(HandlerError::Internal("vibe report is not an object".to_string()));
        };
        tracing::debug!(user_id = %user_id, transactions = summary.transactions, "vibe report computed");

        Ok(enrich(self.generator.as_deref(), Route::VibeReport, result).await?)
    }
}

/// Habits for a customer, or `None` when they have no transactions
pub(crate) fn optional_habits(
    profiles: &ProfileAggregator,
    user_id: &str,
) -> Result<Option<ShoppingHabits>, HandlerError> {
    match profiles.peak_day_and_top_category(user_id) {
        Ok(habits) => Ok(Some(habits)),
        Err(ProfileError::Query(QueryError::EmptyResult(_))) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
