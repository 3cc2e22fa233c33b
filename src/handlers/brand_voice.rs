//! Brand voice: campaign context grounded in top-performing templates

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::dispatch::{RequestEnvelope, Route};
use crate::profile::ProfileAggregator;
use super::generator::{enrich, Generator};
use super::{Handler, HandlerError};

const CAMPAIGN_TEXTS: &str = "campaign_texts";
const CONTACT_IDS: &str = "contact_ids";

pub struct BrandVoiceHandler {
    profiles: Arc<ProfileAggregator>,
    generator: Option<Arc<dyn Generator>>,
    leaderboard_size: usize,
}

impl BrandVoiceHandler {
    pub fn new(
        profiles: Arc<ProfileAggregator>,
        generator: Option<Arc<dyn Generator>>,
        leaderboard_size: usize,
    ) -> Self {
        Self {
            profiles,
            generator,
            leaderboard_size,
        }
    }
}

#[async_trait]
impl Handler for BrandVoiceHandler {
    async fn handle(&self, envelope: &RequestEnvelope) -> Result<Map<String, Value>, HandlerError> {
        let texts = optional_list(envelope, CAMPAIGN_TEXTS)?;
        let contacts = optional_list(envelope, CONTACT_IDS)?;
        if texts.is_empty() && contacts.is_empty() {
            return Err(HandlerError::Validation(format!(
                "a non-empty {} or {} list is required",
                CAMPAIGN_TEXTS, CONTACT_IDS
            )));
        }
        if texts.iter().any(|t| !t.is_string()) {
            return Err(HandlerError::Validation(format!("{} must contain only strings", CAMPAIGN_TEXTS)));
        }

        let leaderboard = self.profiles.campaign_leaderboard(self.leaderboard_size)?;
        let result = json!({
            "campaigns_analyzed": texts.len(),
            "contacts_targeted": contacts.len(),
            "sample_texts": texts,
            "reference_templates": leaderboard.to_records(),
        });
        let Value::Object(result) = result else {
            return Err(HandlerError::Internal("brand voice result is not an object".to_string()));
        };

        Ok(enrich(self.generator.as_deref(), Route::BrandVoice, result).await?)
    }
}

fn optional_list<'a>(envelope: &'a RequestEnvelope, key: &str) -> Result<&'a [Value], HandlerError> {
    if envelope.contains(key) {
        Ok(envelope.require_list(key)?.as_slice())
    } else {
        Ok(&[])
    }
}
