//! Uniform response envelopes

use serde::Serialize;
use serde_json::{Map, Value};

use super::dispatcher::DispatchOutcome;
use super::error::DispatchError;

/// Who has to act on a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    Client,
    Server,
}

impl ErrorClass {
    /// HTTP-style status for transports that need one
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorClass::Client => 400,
            ErrorClass::Server => 500,
        }
    }
}

/// Every dispatch ends in exactly one of these
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Success {
        success: bool,
        route: String,
        result: Map<String, Value>,
        confidence: f64,
        message: String,
    },
    Failure {
        success: bool,
        error: String,
        error_class: ErrorClass,
    },
}

impl ResponseEnvelope {
    pub fn success(outcome: DispatchOutcome) -> Self {
        let message = if outcome.classified {
            format!("Routed to {}: {}", outcome.route, outcome.rationale)
        } else {
            format!("Routed to {} by explicit request", outcome.route)
        };
        ResponseEnvelope::Success {
            success: true,
            route: outcome.route.label().to_string(),
            result: outcome.result,
            confidence: outcome.confidence,
            message,
        }
    }

    pub fn failure(error: &DispatchError) -> Self {
        ResponseEnvelope::Failure {
            success: false,
            error: error.to_string(),
            error_class: error.class(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ResponseEnvelope::Success { .. } => 200,
            ResponseEnvelope::Failure { error_class, .. } => error_class.status_code(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
