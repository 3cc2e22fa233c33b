//! Columnar store loader (verb module)
//!
//! Loads the configured datasets into an in-process store and owns their
//! lifetime. Tables are immutable once registered; reloading a name builds
//! the replacement fully before swapping the binding under an exclusive lock,
//! so readers always see either the old table or the new one.

mod error;
mod loader;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::{Schema, Table};

pub use error::LoadError;
pub use loader::{infer_type, read_delimited};

/// Where a dataset's rows come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLocator {
    /// Header-delimited flat file
    Delimited { path: PathBuf, delimiter: u8 },
}

impl SourceLocator {
    /// Comma separated file with a header row
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        SourceLocator::Delimited {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(self, delimiter: u8) -> Self {
        match self {
            SourceLocator::Delimited { path, .. } => SourceLocator::Delimited { path, delimiter },
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SourceLocator::Delimited { path, .. } => path,
        }
    }

    fn exists(&self) -> bool {
        self.path().is_file()
    }

    fn read(&self, name: &str) -> Result<Table, LoadError> {
        match self {
            SourceLocator::Delimited { path, delimiter } => read_delimited(name, path, *delimiter),
        }
    }
}

/// Name-to-table bindings shared by all readers
#[derive(Debug, Default)]
pub struct Store {
    tables: RwLock<HashMap<String, Arc<Table>>>,
}

impl Store {
    /// A store with no datasets registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every required dataset.
    ///
    /// All sources are checked before any is read, and nothing is registered
    /// unless every dataset loads.
    pub fn load(required: &BTreeMap<String, SourceLocator>) -> Result<Self, LoadError> {
        if let Some((name, locator)) = required.iter().find(|(_, locator)| !locator.exists()) {
            tracing::error!(dataset = %name, path = %locator.path().display(), "required dataset missing");
            return Err(LoadError::MissingDataset {
                name: name.clone(),
                source_path: locator.path().to_path_buf(),
            });
        }

        let mut tables = HashMap::with_capacity(required.len());
        for (name, locator) in required {
            let table = locator.read(name)?;
            tracing::info!(dataset = %name, rows = table.num_rows(), columns = table.schema().len(), "loaded dataset");
            tables.insert(name.clone(), Arc::new(table));
        }

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Re-read a dataset from its source and swap it in.
    ///
    /// The new table is built outside the lock; on failure the previous
    /// binding stays in place.
    pub fn reload(&self, name: &str, locator: &SourceLocator) -> Result<(), LoadError> {
        if !locator.exists() {
            return Err(LoadError::MissingDataset {
                name: name.to_string(),
                source_path: locator.path().to_path_buf(),
            });
        }
        let table = locator.read(name)?;
        let rows = table.num_rows();
        self.tables.write().insert(name.to_string(), Arc::new(table));
        tracing::info!(dataset = %name, rows, "reloaded dataset");
        Ok(())
    }

    /// Drop a binding. Readers holding the table keep their snapshot.
    pub fn unload(&self, name: &str) -> bool {
        self.tables.write().remove(name).is_some()
    }

    /// Current table bound to `name`
    pub fn table(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.read().get(name).cloned()
    }

    pub fn schema(&self, name: &str) -> Option<Schema> {
        self.tables.read().get(name).map(|t| t.schema().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Registered dataset names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }
}
