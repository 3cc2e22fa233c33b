//! Query engine errors

/// Errors raised while building or materializing a query plan
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// No dataset is registered under this name
    #[error("Dataset '{0}' is not loaded")]
    UnknownDataset(String),
    /// A plan references a column its input does not have
    #[error("Unknown column '{column}' (available: {})", available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },
    /// A derived column or aggregate alias would shadow an existing column
    #[error("Column '{0}' is defined more than once")]
    DuplicateColumn(String),
    /// A consumer that needs rows received none
    #[error("{0} produced no rows")]
    EmptyResult(String),
    /// Structurally invalid plan
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}
