//! Intent triage and dispatch (verb module)
//!
//! Normalizes inbound JSON requests, routes them to one of the fixed
//! handler routes (explicitly or through an [`IntentClassifier`]), merges
//! caller and extracted parameters into a [`RequestEnvelope`] and wraps
//! every outcome in a [`ResponseEnvelope`].

mod classifier;
mod dispatcher;
mod error;
mod request;
mod response;

pub use classifier::{IntentClassifier, KeywordClassifier};
pub use dispatcher::{DispatchOutcome, DispatchState, Dispatcher};
pub use error::{CapabilityError, DispatchError};
pub use request::{ParseRouteError, RequestEnvelope, Route, RoutingDecision};
pub use response::{ErrorClass, ResponseEnvelope};
