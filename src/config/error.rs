//! Configuration error types

/// Errors that can occur while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Delimiters must be a single ASCII character
    #[error("Dataset '{dataset}' has invalid delimiter '{delimiter}'")]
    InvalidDelimiter { dataset: String, delimiter: String },
    #[error("No source configured for required dataset '{0}'")]
    MissingDataset(String),
}
