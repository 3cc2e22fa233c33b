//! Intent classification seam

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::CapabilityError;
use super::request::{identifier_string, Route, RoutingDecision};

/// Maps a normalized request to a routing decision.
///
/// Implementations may call out to a remote model; failures surface as
/// [`CapabilityError`] and are not retried by the dispatcher.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, request: &Value) -> Result<RoutingDecision, CapabilityError>;
}

struct RouteRule {
    route: Route,
    /// Phrases matched case-insensitively against the query text
    triggers: &'static [&'static str],
    /// Payload keys that strongly suggest this route
    payload_hints: &'static [&'static str],
    /// Payload keys copied into the extracted parameters
    params: &'static [&'static str],
}

static RULES: [RouteRule; 3] = [
    RouteRule {
        route: Route::VibeReport,
        triggers: &[
            "vibe",
            "persona",
            "shopping style",
            "shopping habits",
            "personality",
            "profile",
            "report",
        ],
        payload_hints: &[],
        params: &["user_id"],
    },
    RouteRule {
        route: Route::BrandVoice,
        triggers: &[
            "campaign",
            "brand voice",
            "marketing",
            "copy",
            "tone",
            "template",
            "email",
        ],
        payload_hints: &["campaign_texts", "contact_ids"],
        params: &["campaign_texts", "contact_ids", "campaign_id", "template_id"],
    },
    RouteRule {
        route: Route::SmartReceipt,
        triggers: &[
            "receipt",
            "basket",
            "recommend",
            "next best",
            "cart",
            "upsell",
            "purchase",
        ],
        payload_hints: &["current_basket_items", "current_basket"],
        params: &["user_id", "current_basket_items"],
    },
];

/// Weight of a payload hint relative to one matched trigger phrase
const HINT_WEIGHT: usize = 2;

/// Confidence reported when nothing matched and the fallback route is used
const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Offline classifier scoring trigger phrases and payload shape.
///
/// Each route scores one point per trigger phrase found in the query and
/// [`HINT_WEIGHT`] per hinted payload key. The best score wins, earlier
/// routes breaking ties; confidence is the winner's share of all points.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    query_key: String,
    context_key: String,
    fallback: Route,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            query_key: "query".to_string(),
            context_key: "data".to_string(),
            fallback: Route::VibeReport,
        }
    }
}

impl KeywordClassifier {
    pub fn new(query_key: impl Into<String>, context_key: impl Into<String>, fallback: Route) -> Self {
        Self {
            query_key: query_key.into(),
            context_key: context_key.into(),
            fallback,
        }
    }

    /// Looks a key up at the top level, then inside the context object
    fn lookup<'a>(&self, request: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
        request
            .get(key)
            .filter(|v| !v.is_null())
            .or_else(|| {
                request
                    .get(&self.context_key)
                    .and_then(Value::as_object)
                    .and_then(|data| data.get(key))
                    .filter(|v| !v.is_null())
            })
    }

    fn extract_params(&self, rule: &RouteRule, request: &Map<String, Value>, query: &str) -> Map<String, Value> {
        let mut params = Map::new();
        for &key in rule.params {
            if let Some(value) = self.lookup(request, key) {
                params.insert(key.to_string(), value.clone());
            }
        }
        if rule.route == Route::SmartReceipt && !params.contains_key("current_basket_items") {
            if let Some(basket) = self.lookup(request, "current_basket") {
                params.insert("current_basket_items".to_string(), basket.clone());
            }
        }
        if rule.params.contains(&"user_id") && !params.contains_key("user_id") {
            if let Some(id) = user_from_text(query) {
                params.insert("user_id".to_string(), Value::String(id));
            }
        }
        params
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, request: &Value) -> Result<RoutingDecision, CapabilityError> {
        let request = request
            .as_object()
            .ok_or_else(|| CapabilityError::unavailable("keyword classifier", "request is not an object"))?;
        let query = request
            .get(&self.query_key)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let text = query.to_lowercase();

        let scores: Vec<usize> = RULES
            .iter()
            .map(|rule| {
                let triggers = rule.triggers.iter().filter(|t| text.contains(*t)).count();
                let hints = rule
                    .payload_hints
                    .iter()
                    .filter(|k| self.lookup(request, k).is_some())
                    .count();
                triggers + HINT_WEIGHT * hints
            })
            .collect();
        let total: usize = scores.iter().sum();

        let mut best = 0;
        for (idx, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = idx;
            }
        }

        let (rule, confidence, rationale) = if total == 0 {
            let rule = RULES
                .iter()
                .find(|r| r.route == self.fallback)
                .unwrap_or(&RULES[0]);
            (
                rule,
                FALLBACK_CONFIDENCE,
                format!("no intent signals matched; defaulting to {}", rule.route),
            )
        } else {
            let rule = &RULES[best];
            (
                rule,
                scores[best] as f64 / total as f64,
                format!("{} of {} intent signals point to {}", scores[best], total, rule.route),
            )
        };

        Ok(RoutingDecision {
            route: rule.route.label().to_string(),
            params: self.extract_params(rule, request, query),
            confidence,
            rationale,
        })
    }
}

/// Token following "user" or "customer" in free text, e.g. "for user 1001".
/// The marker matches in any case; the identifier keeps its original case.
fn user_from_text(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.windows(2).find_map(|pair| {
        let marker = pair[0].trim_matches(|c: char| !c.is_alphanumeric());
        if !marker.eq_ignore_ascii_case("user") && !marker.eq_ignore_ascii_case("customer") {
            return None;
        }
        let id = pair[1].trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_');
        identifier_string(&Value::String(id.to_string()))
    })
}
