//! Handler error types

use crate::dispatch::CapabilityError;
use crate::engine::QueryError;
use crate::profile::ProfileError;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Missing or malformed request parameter; surfaces as a client error
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    #[error("{0}")]
    Internal(String),
}

impl From<QueryError> for HandlerError {
    fn from(err: QueryError) -> Self {
        HandlerError::Profile(ProfileError::Query(err))
    }
}
