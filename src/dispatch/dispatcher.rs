//! Request lifecycle: normalize, route, dispatch

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::DispatcherConfig;
use crate::handlers::{Handler, HandlerError};
use super::classifier::IntentClassifier;
use super::error::DispatchError;
use super::request::{identifier_string, RequestEnvelope, Route};
use super::response::{ErrorClass, ResponseEnvelope};

/// Lifecycle states of one request.
///
/// `Received → Normalized → Routed → Dispatched → Completed`, with any
/// step able to end in `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Normalized,
    Routed,
    Dispatched,
    Completed,
    Rejected,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchState::Received => "received",
            DispatchState::Normalized => "normalized",
            DispatchState::Routed => "routed",
            DispatchState::Dispatched => "dispatched",
            DispatchState::Completed => "completed",
            DispatchState::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// A successfully handled request
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub route: Route,
    pub confidence: f64,
    pub rationale: String,
    /// `false` when an explicit route skipped classification
    pub classified: bool,
    pub envelope: RequestEnvelope,
    pub result: Map<String, Value>,
}

/// Request after normalization
struct NormalizedRequest {
    /// What the classifier sees, including any synthesized query
    request: Map<String, Value>,
    /// Caller-supplied parameters, context object flattened underneath
    caller_fields: Map<String, Value>,
    explicit: Option<Route>,
}

/// Routes each request to exactly one handler.
///
/// Stateless between requests; safe to share across tasks.
pub struct Dispatcher {
    classifier: Arc<dyn IntentClassifier>,
    handlers: HashMap<Route, Arc<dyn Handler>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(classifier: Arc<dyn IntentClassifier>, config: DispatcherConfig) -> Self {
        Self {
            classifier,
            handlers: HashMap::new(),
            config,
        }
    }

    pub fn with_handler(mut self, route: Route, handler: Arc<dyn Handler>) -> Self {
        self.handlers.insert(route, handler);
        self
    }

    pub fn with_handlers(mut self, handlers: HashMap<Route, Arc<dyn Handler>>) -> Self {
        self.handlers.extend(handlers);
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Handle one raw request, always producing an envelope
    pub async fn dispatch(&self, raw: Value) -> ResponseEnvelope {
        match self.try_dispatch(raw).await {
            Ok(outcome) => ResponseEnvelope::success(outcome),
            Err(err) => {
                match err.class() {
                    ErrorClass::Client => {
                        tracing::warn!(error = %err, "request rejected")
                    }
                    ErrorClass::Server => {
                        tracing::error!(error = %err, "request failed")
                    }
                }
                ResponseEnvelope::failure(&err)
            }
        }
    }

    /// Handle one raw request, surfacing the typed error
    pub async fn try_dispatch(&self, raw: Value) -> Result<DispatchOutcome, DispatchError> {
        let result = self.run(raw).await;
        if let Err(err) = &result {
            tracing::debug!(state = %DispatchState::Rejected, error_class = ?err.class(), "dispatch state");
        }
        result
    }

    async fn run(&self, raw: Value) -> Result<DispatchOutcome, DispatchError> {
        transition(DispatchState::Received);
        let normalized = self.normalize(raw)?;
        transition(DispatchState::Normalized);

        let (route, confidence, rationale, extracted, classified) = match normalized.explicit {
            Some(route) => (route, 1.0, "explicit override".to_string(), Map::new(), false),
            None => {
                let decision = self
                    .classifier
                    .classify(&Value::Object(normalized.request.clone()))
                    .await
                    .map_err(DispatchError::Classifier)?;
                let route = decision
                    .route
                    .parse::<Route>()
                    .map_err(|e| DispatchError::UnknownRoute(e.0))?;
                (
                    route,
                    clamp_confidence(decision.confidence),
                    decision.rationale,
                    decision.params,
                    true,
                )
            }
        };
        transition(DispatchState::Routed);
        tracing::info!(route = %route, confidence, classified, "request routed");

        let handler = self
            .handlers
            .get(&route)
            .ok_or(DispatchError::MissingHandler(route))?;
        let envelope = self.reconcile(normalized.caller_fields, extracted);

        transition(DispatchState::Dispatched);
        let result = handler.handle(&envelope).await.map_err(|e| match e {
            HandlerError::Validation(msg) => DispatchError::Validation(msg),
            source => DispatchError::Handler { route, source },
        })?;
        transition(DispatchState::Completed);

        Ok(DispatchOutcome {
            route,
            confidence,
            rationale,
            classified,
            envelope,
            result,
        })
    }

    fn normalize(&self, raw: Value) -> Result<NormalizedRequest, DispatchError> {
        let Value::Object(request) = raw else {
            return Err(DispatchError::Validation("request must be a JSON object".to_string()));
        };
        let cfg = &self.config;

        let explicit = match request.get(&cfg.explicit_route_key) {
            None | Some(Value::Null) => None,
            Some(Value::String(label)) => Some(
                label
                    .parse::<Route>()
                    .map_err(|e| DispatchError::UnknownRoute(e.0))?,
            ),
            Some(other) => return Err(DispatchError::UnknownRoute(other.to_string())),
        };

        let mut caller_fields = match request.get(&cfg.context_key) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(data)) => data.clone(),
            Some(_) => {
                return Err(DispatchError::Validation(format!(
                    "{} must be an object",
                    cfg.context_key
                )))
            }
        };
        for (key, value) in &request {
            if key != &cfg.query_key && key != &cfg.explicit_route_key && key != &cfg.context_key {
                caller_fields.insert(key.clone(), value.clone());
            }
        }

        let mut request = request;
        let has_query = request
            .get(&cfg.query_key)
            .and_then(Value::as_str)
            .is_some_and(|q| !q.trim().is_empty());
        if explicit.is_none() && !has_query {
            let identifier = cfg
                .identifier_fields
                .iter()
                .find_map(|field| caller_fields.get(field).and_then(identifier_string));
            if let Some(id) = identifier {
                let query = cfg.default_route.default_query(&id);
                tracing::debug!(query = %query, "synthesized default query");
                request.insert(cfg.query_key.clone(), Value::String(query));
            }
        }

        Ok(NormalizedRequest {
            request,
            caller_fields,
            explicit,
        })
    }

    /// Extracted parameters win over caller fields, except that a null
    /// extracted identifier never erases one the caller supplied.
    fn reconcile(&self, caller_fields: Map<String, Value>, extracted: Map<String, Value>) -> RequestEnvelope {
        let mut params = caller_fields;
        for (key, value) in extracted {
            let is_identifier = self.config.identifier_fields.iter().any(|f| f == &key);
            let caller_has = params.get(&key).is_some_and(|v| !v.is_null());
            if value.is_null() && is_identifier && caller_has {
                continue;
            }
            params.insert(key, value);
        }
        RequestEnvelope::new(params)
    }
}

fn transition(state: DispatchState) {
    tracing::debug!(state = %state, "dispatch state");
}

fn clamp_confidence(confidence: f64) -> f64 {
    let clamped = if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    };
    if clamped != confidence {
        tracing::warn!(confidence, clamped, "classifier confidence out of range");
    }
    clamped
}
