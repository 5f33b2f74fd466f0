//! Predicate constraints and their translation into a SOQL filter expression.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decode::{parse_timestamp, Row, Value};
use crate::merge::supported_operators;
use crate::naming::ColumnResolver;
use crate::schema::{Column, ColumnType, TableSchema};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterCondition {
    pub column: String,
    pub op: FilterOp,
    #[serde(default)]
    pub value: FilterValue,
}

impl FilterCondition {
    pub fn new(column: &str, op: FilterOp, value: FilterValue) -> Self {
        Self {
            column: column.to_string(),
            op,
            value,
        }
    }

    pub fn eq(column: &str, value: FilterValue) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    IsNull,
    IsNotNull,
    In,
}

impl FilterOp {
    fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Neq => "!=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::IsNull => "=",
            FilterOp::IsNotNull => "!=",
            FilterOp::In => "IN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    StringList(Vec<String>),
    Timestamp(DateTime<Utc>),
}

impl FilterValue {
    pub fn string(s: impl Into<String>) -> Self {
        FilterValue::String(s.into())
    }
}

/// Result of translating a set of constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushdownFilter {
    /// SOQL filter expression without the `WHERE` keyword; empty when nothing translated.
    pub expression: String,
    /// Constraints left for the caller to re-check.
    pub residual: Vec<FilterCondition>,
}

impl PushdownFilter {
    pub fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.residual.len()
    }
}

fn escape_soql_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

fn quote(s: &str) -> String {
    format!("'{}'", escape_soql_string(s))
}

fn format_number(n: f64) -> String {
    if n == n.floor() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_timestamp(ts: &DateTime<Utc>, date_only: bool) -> String {
    if date_only {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

/// Render a literal for a column, or `None` when the value cannot be expressed for its type.
fn render_literal(column: &Column, value: &FilterValue) -> Option<String> {
    match (column.column_type, value) {
        (ColumnType::String, FilterValue::String(s)) => Some(quote(s)),
        (ColumnType::Double, FilterValue::Number(n)) if n.is_finite() => Some(format_number(*n)),
        (ColumnType::Double, FilterValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(format_number),
        (ColumnType::Boolean, FilterValue::Bool(b)) => Some(b.to_string()),
        (ColumnType::Boolean, FilterValue::String(s)) => match s.trim() {
            "true" => Some("true".to_string()),
            "false" => Some("false".to_string()),
            _ => None,
        },
        (ColumnType::Timestamp, FilterValue::Timestamp(ts)) => {
            Some(format_timestamp(ts, column.is_date_only()))
        }
        (ColumnType::Timestamp, FilterValue::String(s)) => parse_timestamp(s)
            .ok()
            .map(|ts| format_timestamp(&ts, column.is_date_only())),
        _ => None,
    }
}

impl FilterCondition {
    /// Render this constraint against a resolved remote field, or `None` if it
    /// cannot be pushed down.
    pub fn to_soql(&self, column: &Column, remote: &str) -> Option<String> {
        if !column.filterable || !supported_operators(column.column_type).contains(&self.op) {
            return None;
        }
        match (&self.op, &self.value) {
            (FilterOp::IsNull, _) | (FilterOp::Eq, FilterValue::Null) => {
                Some(format!("{} = null", remote))
            }
            (FilterOp::IsNotNull, _) | (FilterOp::Neq, FilterValue::Null) => {
                Some(format!("{} != null", remote))
            }
            (_, FilterValue::Null) => None,
            (FilterOp::In, FilterValue::StringList(values)) if !values.is_empty() => {
                let list = values
                    .iter()
                    .map(|v| quote(v))
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(format!("{} IN ({})", remote, list))
            }
            (FilterOp::In, _) => None,
            (op, value) => {
                let literal = render_literal(column, value)?;
                Some(format!("{} {} {}", remote, op.symbol(), literal))
            }
        }
    }
}

/// Order a decoded cell against a constraint literal. `None` when the two
/// cannot be compared, which includes null cells.
fn compare(cell: &Value, literal: &FilterValue) -> Option<Ordering> {
    match (cell, literal) {
        (Value::String(s), FilterValue::String(l)) => Some(s.as_str().cmp(l.as_str())),
        (Value::Double(d), FilterValue::Number(n)) => d.partial_cmp(n),
        (Value::Double(d), FilterValue::String(l)) => {
            l.trim().parse::<f64>().ok().and_then(|n| d.partial_cmp(&n))
        }
        (Value::Boolean(b), FilterValue::Bool(l)) => Some(b.cmp(l)),
        (Value::Boolean(b), FilterValue::String(l)) => l.trim().parse::<bool>().ok().map(|l| b.cmp(&l)),
        (Value::Timestamp(t), FilterValue::Timestamp(l)) => Some(t.cmp(l)),
        (Value::Timestamp(t), FilterValue::String(l)) => parse_timestamp(l).ok().map(|l| t.cmp(&l)),
        (Value::Json(j), FilterValue::String(l)) => {
            let text = j.as_str().map(str::to_string).unwrap_or_else(|| j.to_string());
            Some(text.as_str().cmp(l.as_str()))
        }
        _ => None,
    }
}

impl FilterCondition {
    /// Evaluate this constraint against a decoded row.
    ///
    /// Used for constraints that were not pushed down. A row without the
    /// column is treated as holding null; comparisons against null never match.
    pub fn matches(&self, row: &Row) -> bool {
        let cell = row.get(&self.column).unwrap_or(&Value::Null);
        match (&self.op, &self.value) {
            (FilterOp::IsNull, _) | (FilterOp::Eq, FilterValue::Null) => cell.is_null(),
            (FilterOp::IsNotNull, _) | (FilterOp::Neq, FilterValue::Null) => !cell.is_null(),
            (FilterOp::In, FilterValue::StringList(values)) => cell
                .as_str()
                .map_or(false, |s| values.iter().any(|v| v == s)),
            (FilterOp::In, _) => false,
            (op, literal) => match compare(cell, literal) {
                Some(ordering) => match op {
                    FilterOp::Eq => ordering == Ordering::Equal,
                    FilterOp::Neq => ordering != Ordering::Equal,
                    FilterOp::Lt => ordering == Ordering::Less,
                    FilterOp::Lte => ordering != Ordering::Greater,
                    FilterOp::Gt => ordering == Ordering::Greater,
                    FilterOp::Gte => ordering != Ordering::Less,
                    FilterOp::IsNull | FilterOp::IsNotNull | FilterOp::In => false,
                },
                None => false,
            },
        }
    }
}

/// Translate constraints into a conjunction of SOQL comparisons.
///
/// Constraints on columns outside the schema, or with an operator/value the
/// remote side cannot evaluate for the column's type, are left out; the
/// caller re-checks them on the returned rows.
pub fn translate(
    conditions: &[FilterCondition],
    schema: &TableSchema,
    resolver: &ColumnResolver,
) -> PushdownFilter {
    let mut parts = Vec::with_capacity(conditions.len());
    let mut residual = Vec::new();

    for condition in conditions {
        let rendered = schema
            .column(&condition.column)
            .and_then(|column| condition.to_soql(column, resolver.remote_name(&column.name)));
        match rendered {
            Some(part) => parts.push(part),
            None => {
                debug!(
                    "Not pushing down {:?} on '{}'",
                    condition.op, condition.column
                );
                residual.push(condition.clone());
            }
        }
    }

    PushdownFilter {
        expression: parts.join(" AND "),
        residual,
    }
}
