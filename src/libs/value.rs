use std::collections::BTreeMap;

use serde_json::Value as Json;

use crate::libs::error::{Error, Result};
use crate::libs::schema::{ColumnKind, Table};

/// A typed value supplied for one column of an insert.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
}

impl Value {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::String(_) => ColumnKind::String,
            Value::Int8(_) => ColumnKind::Int8,
            Value::Int16(_) => ColumnKind::Int16,
            Value::Int32(_) => ColumnKind::Int32,
            Value::Int64(_) => ColumnKind::Int64,
            Value::Float32(_) => ColumnKind::Float32,
            Value::Float64(_) => ColumnKind::Float64,
            Value::Bool(_) => ColumnKind::Bool,
        }
    }

    /// Render as a SQL literal.
    ///
    /// Strings are single-quoted with embedded quotes doubled. Floats use
    /// scientific notation with 20 digits after the point; non-finite floats
    /// use Postgres' quoted spellings.
    pub fn to_literal(&self) -> String {
        match self {
            Value::String(s) => quote(s),
            Value::Int8(v) => v.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float32(v) => float_literal(f64::from(*v), format!("{:.20e}", v)),
            Value::Float64(v) => float_literal(*v, format!("{:.20e}", v)),
            Value::Bool(v) => v.to_string(),
        }
    }

    /// Convert a JSON value into the column's declared kind.
    pub fn from_json(column: &str, kind: ColumnKind, json: &Json) -> Result<Self> {
        let mismatch = || Error::type_mismatch(column, kind, json_kind(json));
        match json {
            Json::Null | Json::Array(_) | Json::Object(_) => {
                return Err(Error::unsupported_value(column, json_kind(json)));
            }
            _ => {}
        }
        let value = match kind {
            ColumnKind::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_string()),
            ColumnKind::Bool => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
            ColumnKind::Int8 => Value::Int8(int_from_json(json).ok_or_else(mismatch)?),
            ColumnKind::Int16 => Value::Int16(int_from_json(json).ok_or_else(mismatch)?),
            ColumnKind::Int32 => Value::Int32(int_from_json(json).ok_or_else(mismatch)?),
            ColumnKind::Int64 => Value::Int64(json.as_i64().ok_or_else(mismatch)?),
            ColumnKind::Float32 => {
                let wide = json.as_f64().ok_or_else(mismatch)?;
                let narrow = wide as f32;
                if wide.is_finite() && !narrow.is_finite() {
                    return Err(mismatch());
                }
                Value::Float32(narrow)
            }
            ColumnKind::Float64 => Value::Float64(json.as_f64().ok_or_else(mismatch)?),
        };
        Ok(value)
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn float_literal(v: f64, formatted: String) -> String {
    if v.is_nan() {
        "'NaN'".to_string()
    } else if v == f64::INFINITY {
        "'Infinity'".to_string()
    } else if v == f64::NEG_INFINITY {
        "'-Infinity'".to_string()
    } else {
        formatted
    }
}

fn int_from_json<T: TryFrom<i64>>(json: &Json) -> Option<T> {
    json.as_i64().and_then(|v| T::try_from(v).ok())
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "integer",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Column values for a single insert, in the order they were supplied.
/// Setting a column twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a row from a JSON object, coercing each field to the kind of the
    /// matching column in `table`.
    pub fn from_json(table_name: &str, table: &Table, json: &Json) -> Result<Self> {
        let Json::Object(map) = json else {
            return Err(Error::InvalidRecord {
                table: table_name.to_string(),
                found: json_kind(json).to_string(),
            });
        };
        let mut row = Row::new();
        for (key, field) in map {
            let column = table
                .get(key)
                .ok_or_else(|| Error::unknown_column(table_name, key))?;
            row.set(key.as_str(), Value::from_json(key, column.kind(), field)?);
        }
        Ok(row)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

/// Validated column names with their values, order-consistent with each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedRow {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl EncodedRow {
    pub fn literals(&self) -> Vec<String> {
        self.values.iter().map(Value::to_literal).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Check every value of `row` against the declared columns of `table_name`.
pub fn encode_row(
    tables: &BTreeMap<String, Table>,
    table_name: &str,
    row: &Row,
) -> Result<EncodedRow> {
    let table = tables
        .get(table_name)
        .ok_or_else(|| Error::UnknownTable(table_name.to_string()))?;

    let mut encoded = EncodedRow::default();
    for (key, value) in row.iter() {
        let column = table
            .get(key)
            .ok_or_else(|| Error::unknown_column(table_name, key))?;
        if value.kind() != column.kind() {
            return Err(Error::type_mismatch(key, column.kind(), value.kind().tag()));
        }
        encoded.columns.push(key.to_string());
        encoded.values.push(value.clone());
    }
    Ok(encoded)
}
