//! Configuration parser (verb module)
//!
//! Reads the YAML application config: dataset sources, dispatcher field
//! names and leaderboard size. Every section is optional.
//!
//! ```yaml
//! datasets:
//!   sales: { path: data/sales.csv }
//!   contacts: { path: data/contacts.tsv, delimiter: "\t" }
//! dispatcher:
//!   explicit_route_key: agent_type
//!   default_route: vibe_report
//! leaderboard:
//!   top_n: 5
//! ```

mod error;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dispatch::Route;
use crate::profile::datasets::REQUIRED;
use crate::store::SourceLocator;

pub use error::ConfigError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset name to source; defaults to `<name>.csv` for each required dataset
    pub datasets: BTreeMap<String, DatasetConfig>,
    pub dispatcher: DispatcherConfig,
    pub leaderboard: LeaderboardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            datasets: REQUIRED
                .iter()
                .map(|name| (name.to_string(), DatasetConfig::new(format!("{}.csv", name))))
                .collect(),
            dispatcher: DispatcherConfig::default(),
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub delimiter: Option<String>,
}

impl DatasetConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: None,
        }
    }
}

/// Request field names the dispatcher reads
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Names a route directly, skipping classification
    pub explicit_route_key: String,
    /// Free-text request
    pub query_key: String,
    /// Nested object flattened under top-level fields
    pub context_key: String,
    /// Fields that identify a subject, in lookup order for the default query
    pub identifier_fields: Vec<String>,
    /// Route whose default query is synthesized for identifier-only requests
    pub default_route: Route,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            explicit_route_key: "agent_type".to_string(),
            query_key: "query".to_string(),
            context_key: "data".to_string(),
            identifier_fields: ["user_id", "customer_id", "cid", "contact_ids", "campaign_id", "template_id"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_route: Route::VibeReport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub top_n: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

impl AppConfig {
    /// Source locators with relative paths resolved against `base_dir`.
    ///
    /// Fails if a required dataset has no entry or a delimiter is not a
    /// single ASCII character.
    pub fn locators(&self, base_dir: &Path) -> Result<BTreeMap<String, SourceLocator>, ConfigError> {
        if let Some(missing) = REQUIRED.iter().find(|name| !self.datasets.contains_key(**name)) {
            return Err(ConfigError::MissingDataset(missing.to_string()));
        }
        self.datasets
            .iter()
            .map(|(name, dataset)| {
                let path = if dataset.path.is_absolute() {
                    dataset.path.clone()
                } else {
                    base_dir.join(&dataset.path)
                };
                let locator = SourceLocator::csv(path);
                let locator = match &dataset.delimiter {
                    None => locator,
                    Some(d) => locator.with_delimiter(parse_delimiter(name, d)?),
                };
                Ok((name.clone(), locator))
            })
            .collect()
    }
}

fn parse_delimiter(dataset: &str, raw: &str) -> Result<u8, ConfigError> {
    match raw.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(ConfigError::InvalidDelimiter {
            dataset: dataset.to_string(),
            delimiter: raw.to_string(),
        }),
    }
}

/// Parse config from a YAML file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path_str = path.as_ref().display().to_string();
    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
        path: path_str,
        source: e,
    })?;
    parse_str(&contents)
}

/// Parse config from a YAML string
pub fn parse_str(yaml: &str) -> Result<AppConfig, ConfigError> {
    Ok(serde_yaml::from_str(yaml)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_required_datasets() {
        let config = parse_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        let locators = config.locators(Path::new("/data")).unwrap();
        assert_eq!(locators["sales"].path(), Path::new("/data/sales.csv"));
        assert_eq!(config.dispatcher.explicit_route_key, "agent_type");
        assert_eq!(config.leaderboard.top_n, 5);
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
datasets:
  sales: { path: s.tsv, delimiter: "\t" }
  contacts: { path: /abs/contacts.csv }
  sku: { path: sku.csv }
  campaign_metrics: { path: cm.csv }
dispatcher:
  default_route: smart_receipt
  identifier_fields: [cid]
"#;
        let config = parse_str(yaml).unwrap();
        assert_eq!(config.dispatcher.default_route, Route::SmartReceipt);
        assert_eq!(config.dispatcher.query_key, "query");
        assert_eq!(config.dispatcher.identifier_fields, vec!["cid".to_string()]);

        let locators = config.locators(Path::new("base")).unwrap();
        assert_eq!(locators["sales"], SourceLocator::csv("base/s.tsv").with_delimiter(b'\t'));
        assert_eq!(locators["contacts"].path(), Path::new("/abs/contacts.csv"));
    }

    #[test]
    fn test_rejects_bad_delimiter_and_missing_dataset() {
        let yaml = r#"
datasets:
  sales: { path: s.csv, delimiter: "||" }
  contacts: { path: c.csv }
  sku: { path: k.csv }
  campaign_metrics: { path: m.csv }
"#;
        let err = parse_str(yaml).unwrap().locators(Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelimiter { ref delimiter, .. } if delimiter == "||"));

        let err = parse_str("datasets:\n  sales: { path: s.csv }\n")
            .unwrap()
            .locators(Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingDataset(ref name) if name == "contacts"));

        assert!(matches!(parse_str("leaderboard: [1"), Err(ConfigError::Yaml(_))));
    }
}
