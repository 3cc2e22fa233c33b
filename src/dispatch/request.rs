//! Routes, routing decisions and request envelopes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::handlers::HandlerError;

/// The fixed set of handler routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Customer persona and behavioural metrics; requires `user_id`
    VibeReport,
    /// Campaign copy in the brand's voice; requires `campaign_texts` or `contact_ids`
    BrandVoice,
    /// Next-best-item recommendation; requires `user_id` and `current_basket_items`
    SmartReceipt,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::VibeReport, Route::BrandVoice, Route::SmartReceipt];

    pub fn label(&self) -> &'static str {
        match self {
            Route::VibeReport => "vibe_report",
            Route::BrandVoice => "brand_voice",
            Route::SmartReceipt => "smart_receipt",
        }
    }

    /// Query synthesized when a request carries only an identifier
    pub fn default_query(&self, identifier: &str) -> String {
        match self {
            Route::VibeReport => format!("Generate a vibe report for user {}", identifier),
            Route::BrandVoice => format!("Create a new marketing campaign for contact {}", identifier),
            Route::SmartReceipt => format!("Recommend the next best item for user {}", identifier),
        }
    }
}

impl Default for Route {
    fn default() -> Self {
        Route::VibeReport
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error when parsing a route label
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown route '{0}'")]
pub struct ParseRouteError(pub String);

impl FromStr for Route {
    type Err = ParseRouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        Route::ALL
            .into_iter()
            .find(|r| r.label() == label)
            .ok_or_else(|| ParseRouteError(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Route::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Route {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

/// What the intent classifier returns for one request.
///
/// `route` is an unvalidated label; the dispatcher rejects labels outside
/// [`Route::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub route: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    pub confidence: f64,
    #[serde(default)]
    pub rationale: String,
}

/// Reconciled parameters handed to a handler
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestEnvelope {
    params: Map<String, Value>,
}

impl RequestEnvelope {
    pub fn new(params: Map<String, Value>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Identifier as a string; JSON numbers are accepted
    pub fn identifier(&self, key: &str) -> Option<String> {
        self.get(key).and_then(identifier_string)
    }

    pub fn require_identifier(&self, key: &str) -> Result<String, HandlerError> {
        self.identifier(key)
            .ok_or_else(|| HandlerError::Validation(format!("{} is required", key)))
    }

    pub fn list(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// A list parameter; present but not a list is a validation error
    pub fn require_list(&self, key: &str) -> Result<&Vec<Value>, HandlerError> {
        match self.get(key) {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(HandlerError::Validation(format!("{} must be a list", key))),
            None => Err(HandlerError::Validation(format!("{} list is required", key))),
        }
    }
}

/// Scalar JSON value rendered as an identifier string
pub(crate) fn identifier_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_labels_round_trip() {
        for route in Route::ALL {
            assert_eq!(route.label().parse::<Route>().unwrap(), route);
        }
        assert_eq!(" Brand_Voice ".parse::<Route>().unwrap(), Route::BrandVoice);
        assert!("loyalty".parse::<Route>().is_err());
    }

    #[test]
    fn test_routing_decision_defaults() {
        let decision: RoutingDecision =
            serde_json::from_value(json!({"route": "vibe_report", "confidence": 0.7})).unwrap();
        assert!(decision.params.is_empty());
        assert_eq!(decision.rationale, "");
    }

    #[test]
    fn test_envelope_accessors() {
        let envelope = match json!({"user_id": 1001, "items": "x", "blank": "  ", "gone": null}) {
            Value::Object(map) => RequestEnvelope::new(map),
            _ => unreachable!(),
        };
        assert_eq!(envelope.identifier("user_id").as_deref(), Some("1001"));
        assert!(envelope.identifier("blank").is_none());
        assert!(!envelope.contains("gone"));
        assert!(matches!(
            envelope.require_list("items"),
            Err(HandlerError::Validation(msg)) if msg == "items must be a list"
        ));
        assert!(envelope.require_identifier("cid").is_err());
    }
}
