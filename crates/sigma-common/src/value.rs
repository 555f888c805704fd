//! Tagged scalar values and records
//!
//! Report rows arrive as untyped CSV text. Rather than threading raw
//! strings through the pipeline, each cell is classified into a [`Value`]
//! so the schema-widening rules operate on explicit type tags. A
//! [`Record`] is one row: ordered (column, value) pairs, preserving the
//! header's column order.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single scalar cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Classify a raw CSV field into a scalar value.
    ///
    /// An empty field is null; `true`/`false` are booleans; anything that
    /// parses as an i64 is an integer; anything that parses as an f64 is
    /// a float; everything else, including JSON-looking nested text, is
    /// carried through as an opaque string.
    pub fn from_csv_field(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Null;
        }
        match raw {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {},
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
        Value::String(raw.to_string())
    }

    /// True for `Value::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

/// One row of the staged file: ordered (column, value) pairs.
///
/// Serializes as a JSON object in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Callers are expected to push each column once,
    /// in header order.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.fields.push((column.into(), value));
    }

    /// Look up a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_classification() {
        assert_eq!(Value::from_csv_field(""), Value::Null);
        assert_eq!(Value::from_csv_field("true"), Value::Bool(true));
        assert_eq!(Value::from_csv_field("false"), Value::Bool(false));
        assert_eq!(Value::from_csv_field("42"), Value::Integer(42));
        assert_eq!(Value::from_csv_field("-7"), Value::Integer(-7));
        assert_eq!(Value::from_csv_field("3.25"), Value::Float(3.25));
        assert_eq!(
            Value::from_csv_field("hello"),
            Value::String("hello".to_string())
        );
    }

    #[test]
    fn test_nested_looking_text_stays_opaque() {
        let raw = r#"{"country": "US"}"#;
        assert_eq!(Value::from_csv_field(raw), Value::String(raw.to_string()));
    }

    #[test]
    fn test_true_as_word_not_boolean() {
        // Only the exact lowercase literals are booleans
        assert_eq!(
            Value::from_csv_field("True"),
            Value::String("True".to_string())
        );
    }

    #[test]
    fn test_record_serializes_in_column_order() {
        let mut record = Record::new();
        record.push("b", Value::Integer(1));
        record.push("a", Value::String("x".to_string()));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"b":1,"a":"x"}"#);
    }

    #[test]
    fn test_record_get() {
        let mut record = Record::new();
        record.push("amount", Value::Integer(10));
        assert_eq!(record.get("amount"), Some(&Value::Integer(10)));
        assert_eq!(record.get("missing"), None);
    }
}
