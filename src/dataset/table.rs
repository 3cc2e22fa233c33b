//! Schema-bearing columnar tables

use serde::Serialize;

use super::types::DataType;
use super::value::Value;

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the index of a column by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }
}

/// An immutable dataset held column by column.
///
/// Every column vector has exactly `num_rows` entries.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    columns: Vec<Vec<Value>>,
    num_rows: usize,
}

impl Table {
    /// Build a table from columns. Returns `None` when the column count does
    /// not match the schema or the columns have different lengths.
    pub fn from_columns(
        name: impl Into<String>,
        schema: Schema,
        columns: Vec<Vec<Value>>,
    ) -> Option<Self> {
        if columns.len() != schema.len() {
            return None;
        }
        let num_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        if columns.iter().any(|c| c.len() != num_rows) {
            return None;
        }
        Some(Self {
            name: name.into(),
            schema,
            columns,
            num_rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.schema
            .index_of(name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Copy out the requested columns row by row, in the given order
    pub fn rows_for(&self, column_names: &[String]) -> Option<Vec<Vec<Value>>> {
        let indices: Vec<usize> = column_names
            .iter()
            .map(|n| self.schema.index_of(n))
            .collect::<Option<_>>()?;
        Some(
            (0..self.num_rows)
                .map(|row| indices.iter().map(|&c| self.columns[c][row].clone()).collect())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int),
            Field::new("name", DataType::String),
        ]);
        Table::from_columns(
            "people",
            schema,
            vec![
                vec![Value::Int(1), Value::Int(2)],
                vec![Value::from("a"), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rows_for_reorders_columns() {
        let table = sample();
        let rows = table
            .rows_for(&["name".to_string(), "id".to_string()])
            .unwrap();
        assert_eq!(rows[0], vec![Value::from("a"), Value::Int(1)]);
        assert_eq!(rows[1], vec![Value::Null, Value::Int(2)]);
        assert!(table.rows_for(&["missing".to_string()]).is_none());
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int),
            Field::new("b", DataType::Int),
        ]);
        let table = Table::from_columns("t", schema, vec![vec![Value::Int(1)], vec![]]);
        assert!(table.is_none());
    }
}
