//! Typed decoding of raw remote records into output rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::client::Record;
use crate::error::{ForceError, Result};
use crate::naming::ColumnResolver;
use crate::schema::{Column, ColumnType};

/// Metadata envelope the remote API attaches to every record.
const ATTRIBUTES_FIELD: &str = "attributes";

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    String(String),
    Double(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// One output row: canonical column name -> value, in projection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Parse the timestamp spellings the remote API produces.
///
/// Accepts `2021-03-01T10:00:00.000+0000`, RFC 3339 and bare `2021-03-01` dates.
pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("'{}' is not a recognized timestamp", s))
}

/// Convert one raw field value according to the column's declared type.
pub fn decode_value(column: &Column, raw: &serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;

    let mismatch = |expected: &str| {
        ForceError::decode(
            &column.name,
            format!("expected {}, got {}", expected, raw),
        )
    };

    match (column.column_type, raw) {
        (_, Json::Null) => Ok(Value::Null),
        (ColumnType::Json, other) => Ok(Value::Json(other.clone())),

        (ColumnType::String, Json::String(s)) => Ok(Value::String(s.clone())),
        (ColumnType::String, Json::Number(n)) => Ok(Value::String(n.to_string())),
        (ColumnType::String, Json::Bool(b)) => Ok(Value::String(b.to_string())),
        (ColumnType::String, _) => Err(mismatch("a string")),

        (ColumnType::Double, Json::Number(n)) => {
            n.as_f64().map(Value::Double).ok_or_else(|| mismatch("a number"))
        }
        (ColumnType::Double, Json::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| mismatch("a number")),
        (ColumnType::Double, _) => Err(mismatch("a number")),

        (ColumnType::Boolean, Json::Bool(b)) => Ok(Value::Boolean(*b)),
        (ColumnType::Boolean, Json::String(s)) => match s.trim() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(mismatch("a boolean")),
        },
        (ColumnType::Boolean, _) => Err(mismatch("a boolean")),

        (ColumnType::Timestamp, Json::String(s)) => parse_timestamp(s)
            .map(Value::Timestamp)
            .map_err(|e| ForceError::decode(&column.name, e)),
        (ColumnType::Timestamp, _) => Err(mismatch("a timestamp string")),
    }
}

/// Decode a raw record into a row holding exactly the `projection` columns.
///
/// Record fields are mapped remote -> canonical through the resolver; fields
/// outside the projection are ignored and projected columns the record lacks
/// come out as `Null`.
pub fn decode_record(
    record: &Record,
    projection: &[Column],
    resolver: &ColumnResolver,
) -> Result<Row> {
    let mut slots: Vec<Option<Value>> = vec![None; projection.len()];

    for (remote, raw) in record {
        if remote == ATTRIBUTES_FIELD {
            continue;
        }
        let canonical = resolver.canonical_name(remote);
        if let Some(idx) = projection.iter().position(|c| c.name == canonical) {
            slots[idx] = Some(decode_value(&projection[idx], raw)?);
        }
    }

    let cells = projection
        .iter()
        .zip(slots)
        .map(|(column, slot)| (column.name.clone(), slot.unwrap_or(Value::Null)))
        .collect();

    Ok(Row { cells })
}
