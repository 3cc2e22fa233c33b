//! Dispatch error types

use super::request::Route;
use super::response::ErrorClass;
use crate::handlers::HandlerError;

/// An external collaborator (classifier, generator) could not be reached
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{capability} is unavailable: {reason}")]
pub struct CapabilityError {
    pub capability: String,
    pub reason: String,
}

impl CapabilityError {
    pub fn unavailable(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            reason: reason.into(),
        }
    }
}

/// Reasons a request ends in the `Rejected` state or fails server-side
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Route label outside the fixed set, from the caller or the classifier
    #[error("Unknown route '{0}'")]
    UnknownRoute(String),
    /// Malformed request or missing handler parameter
    #[error("Invalid request: {0}")]
    Validation(String),
    /// The intent classifier failed; never retried here
    #[error("Classification failed: {0}")]
    Classifier(#[source] CapabilityError),
    #[error("No handler registered for route '{0}'")]
    MissingHandler(Route),
    /// Any non-validation handler failure
    #[error("Handler for '{route}' failed: {source}")]
    Handler {
        route: Route,
        #[source]
        source: HandlerError,
    },
}

impl DispatchError {
    /// Client errors are the caller's to fix; everything else is ours
    pub fn class(&self) -> ErrorClass {
        match self {
            DispatchError::UnknownRoute(_) | DispatchError::Validation(_) => ErrorClass::Client,
            DispatchError::Classifier(_)
            | DispatchError::MissingHandler(_)
            | DispatchError::Handler { .. } => ErrorClass::Server,
        }
    }
}
