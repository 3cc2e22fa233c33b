//! Cell values

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use super::types::DataType;

/// A single cell in a table or materialized result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The type of this value, `None` for null
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Bool),
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::Str(_) => Some(DataType::String),
        }
    }

    /// Numeric view of the value. Strings are not coerced here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Only `Bool(true)` is truthy; predicates evaluating to null reject the row
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Hashing key used for grouping and distinct counts.
    ///
    /// Integral floats share the key of the equivalent integer. Strings keep
    /// their text verbatim, so `"007"` and `"7"` stay apart exactly as they
    /// do under `compare`. Null has no key and never matches.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(format!("b:{}", b)),
            Value::Int(i) => Some(format!("n:{}", i)),
            Value::Float(f) => Some(format!("n:{}", float_key(*f))),
            Value::Str(s) => Some(format!("s:{}", s)),
        }
    }

    /// Key for matching against a numeric peer: strings are parsed as
    /// numbers, so `"1001"` joins with `1001`. Unparseable strings keep
    /// their verbatim key and match nothing numeric.
    pub fn numeric_key(&self) -> Option<String> {
        match self {
            Value::Str(s) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Some(format!("n:{}", float_key(f))),
                _ => self.key(),
            },
            other => other.key(),
        }
    }

    /// SQL-style comparison: `None` when either side is null or the values
    /// are not comparable. A string compared to a number is parsed as a number.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Str(s), n) if n.as_f64().is_some() => {
                let parsed = s.trim().parse::<f64>().ok()?;
                parsed.partial_cmp(&n.as_f64()?)
            }
            (n, Value::Str(s)) if n.as_f64().is_some() => {
                let parsed = s.trim().parse::<f64>().ok()?;
                n.as_f64()?.partial_cmp(&parsed)
            }
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    /// Total order used by sorting: nulls and incomparable values last,
    /// otherwise `compare`.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self
                .compare(other)
                .unwrap_or_else(|| self.to_string().cmp(&other.to_string())),
        }
    }

    /// Parse a raw source cell as the given type. Empty cells become null.
    pub fn parse_as(raw: &str, data_type: DataType) -> Option<Value> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Some(Value::Null);
        }
        match data_type {
            DataType::Int => raw.parse::<i64>().ok().map(Value::Int),
            DataType::Float => raw.parse::<f64>().ok().map(Value::Float),
            DataType::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            DataType::String => Some(Value::Str(raw.to_string())),
        }
    }

    /// Convert to a JSON value; non-finite floats become null
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

fn float_key(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_string_coercion() {
        let id = Value::Int(20186130);
        assert_eq!(id.compare(&Value::from("20186130")), Some(Ordering::Equal));
        assert_eq!(Value::from("abc").compare(&id), None);
        assert_eq!(id.key(), Value::from("20186130").numeric_key());
        assert_eq!(Value::Float(3.0).key(), Value::Int(3).key());
    }

    #[test]
    fn test_string_keys_are_verbatim() {
        assert_ne!(Value::from("007").key(), Value::from("7").key());
        assert_ne!(Value::from("7").key(), Value::Int(7).key());
        assert_eq!(Value::from("007").numeric_key(), Value::Int(7).key());
        assert_eq!(Value::from("X").numeric_key(), Value::from("X").key());
        assert_ne!(Value::from("007").compare(&Value::from("7")), Some(Ordering::Equal));
    }

    #[test]
    fn test_null_semantics() {
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(Value::Null.key(), None);
        assert!(!Value::Null.is_true());
        assert_eq!(Value::Null.sort_cmp(&Value::Int(1)), Ordering::Greater);
    }

    #[test]
    fn test_parse_as() {
        assert_eq!(Value::parse_as("42", DataType::Int), Some(Value::Int(42)));
        assert_eq!(Value::parse_as("4.5", DataType::Int), None);
        assert_eq!(Value::parse_as("", DataType::Float), Some(Value::Null));
        assert_eq!(Value::parse_as("TRUE", DataType::Bool), Some(Value::Bool(true)));
    }

    #[test]
    fn test_non_finite_float_serializes_as_null() {
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
