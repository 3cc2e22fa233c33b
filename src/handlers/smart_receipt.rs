//! Smart receipt: next-best-item recommendation for a basket

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::dispatch::{RequestEnvelope, Route};
use crate::profile::columns::{DESCRIPTION, ITEM_SID, LIST_PRICE};
use crate::profile::ProfileAggregator;
use super::generator::{enrich, Generator};
use super::vibe::optional_habits;
use super::{Handler, HandlerError};

const BASKET: &str = "current_basket_items";

pub struct SmartReceiptHandler {
    profiles: Arc<ProfileAggregator>,
    generator: Option<Arc<dyn Generator>>,
}

impl SmartReceiptHandler {
    pub fn new(profiles: Arc<ProfileAggregator>, generator: Option<Arc<dyn Generator>>) -> Self {
        Self { profiles, generator }
    }

    /// Priciest item in the category that the basket does not hold yet
    fn next_best_item(&self, category: &str, basket: &HashSet<String>) -> Result<Value, HandlerError> {
        let catalog = self.profiles.category_catalog(category)?;
        let pick = catalog.to_records().into_iter().find(|item| {
            item.get(DESCRIPTION)
                .and_then(Value::as_str)
                .is_some_and(|name| !basket.contains(&name.to_lowercase()))
        });
        Ok(match pick {
            Some(item) => json!({
                "item_id": item.get(ITEM_SID).cloned().unwrap_or(Value::Null),
                "item_name": item.get(DESCRIPTION).cloned().unwrap_or(Value::Null),
                "price": item.get(LIST_PRICE).cloned().unwrap_or(Value::Null),
                "quantity": 1,
            }),
            None => Value::Null,
        })
    }
}

#[async_trait]
impl Handler for SmartReceiptHandler {
    async fn handle(&self, envelope: &RequestEnvelope) -> Result<Map<String, Value>, HandlerError> {
        let user_id = envelope.require_identifier("user_id")?;
        let items = envelope.require_list(BASKET)?;
        let basket: HashSet<String> = items.iter().filter_map(item_name).collect();

        let summary = self.profiles.spend_summary(&user_id)?;
        let top_category = optional_habits(&self.profiles, &user_id)?.and_then(|h| h.top_category);
        let next_best = match &top_category {
            Some(category) => self.next_best_item(category, &basket)?,
            None => Value::Null,
        };

        let result = json!({
            "user_id": user_id,
            "basket_items_count": items.len(),
            "past_transactions": summary.transactions,
            "top_category": top_category,
            "next_best_item": next_best,
        });
        let Value::Object(result) = result else {
            return Err(HandlerError::Internal("smart receipt is not an object".to_string()));
        };

        Ok(enrich(self.generator.as_deref(), Route::SmartReceipt, result).await?)
    }
}

/// Basket entries are plain names or objects carrying `item_name`
fn item_name(item: &Value) -> Option<String> {
    match item {
        Value::String(name) => Some(name.to_lowercase()),
        Value::Object(fields) => fields
            .get("item_name")
            .and_then(Value::as_str)
            .map(str::to_lowercase),
        _ => None,
    }
}
