//! Store error types

use std::path::PathBuf;

/// Errors that can occur while loading or reloading datasets
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A required dataset's backing source does not exist
    #[error("Dataset '{name}' is missing: source '{}' not found", source_path.display())]
    MissingDataset { name: String, source_path: PathBuf },
    /// Unreadable or malformed delimited file
    #[error("Failed to read '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// Header row repeats a column name
    #[error("Dataset '{name}' declares column '{column}' more than once")]
    DuplicateColumn { name: String, column: String },
    /// Parsed columns do not line up into a table
    #[error("Dataset '{name}' has columns of differing lengths")]
    Malformed { name: String },
}
