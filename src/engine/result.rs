//! Materialized query results

use serde::Serialize;

use crate::dataset::{Schema, Value};
use super::error::QueryError;

/// Rows produced by evaluating a plan once.
///
/// Serialization is deterministic: fields in schema order, rows in
/// evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterializedResult {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl MaterializedResult {
    pub(crate) fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.schema.index_of(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All values of one column
    pub fn column(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.schema.index_of(column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.schema
                    .fields()
                    .iter()
                    .zip(row)
                    .map(|(field, value)| (field.name.clone(), value.to_json()))
                    .collect()
            })
            .collect()
    }

    /// Fail with `EmptyResult` when a consumer needs at least one row
    pub fn require_non_empty(self, context: &str) -> Result<Self, QueryError> {
        if self.rows.is_empty() {
            return Err(QueryError::EmptyResult(context.to_string()));
        }
        Ok(self)
    }
}
