//! Profile aggregator errors

use crate::engine::QueryError;

/// Errors raised while building customer, group or campaign summaries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    /// Passed through from the query engine unchanged
    #[error(transparent)]
    Query(#[from] QueryError),
    /// The id range matched no customers
    #[error("No customers with id in [{start}, {end}]")]
    EmptyGroup { start: i64, end: i64 },
}
