//! Table schema types shared by the merger, translator, builder and decoder.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic type of a column as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Double,
    Boolean,
    Timestamp,
    Json,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::String => "string",
            ColumnType::Double => "double",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Json => "json",
        };
        f.write_str(s)
    }
}

fn filterable_default() -> bool {
    true
}

/// A single output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub description: String,
    /// Sort entries on this column may be pushed down.
    #[serde(default)]
    pub sortable: bool,
    /// Constraints on this column may be pushed down. Cleared when
    /// introspection reports the remote field as non-filterable.
    #[serde(default = "filterable_default")]
    pub filterable: bool,
    /// Exact remote field spelling, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_name: Option<String>,
    /// Remote field type reported by introspection (`date`, `datetime`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_type: Option<String>,
}

impl Column {
    pub fn new(name: &str, column_type: ColumnType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            description: description.to_string(),
            sortable: false,
            filterable: true,
            remote_name: None,
            remote_type: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Pin the remote spelling for names whose CamelCase form is ambiguous.
    pub fn remote(mut self, remote_name: &str) -> Self {
        self.remote_name = Some(remote_name.to_string());
        self
    }

    /// True when the remote field holds a calendar date without a time part.
    pub fn is_date_only(&self) -> bool {
        self.remote_type.as_deref() == Some("date")
    }
}

/// Ordered, de-duplicated column list of one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    /// Build a schema, keeping the first column for each name.
    pub fn new(columns: Vec<Column>) -> Self {
        let mut schema = Self::default();
        for column in columns {
            schema.push(column);
        }
        schema
    }

    /// Append a column. Returns `false` if the name is already taken.
    pub fn push(&mut self, column: Column) -> bool {
        if self.column(&column.name).is_some() {
            return false;
        }
        self.columns.push(column);
        true
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_keeps_first_duplicate() {
        let schema = TableSchema::new(vec![
            Column::new("name", ColumnType::String, "first"),
            Column::new("name", ColumnType::Double, "second"),
            Column::new("phone", ColumnType::String, "phone"),
        ]);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.column("name").unwrap().description, "first");
        assert_eq!(schema.names(), vec!["name", "phone"]);
    }

    #[test]
    fn test_column_builders() {
        let col = Column::new("last_cu_request_date", ColumnType::Timestamp, "d")
            .sortable()
            .remote("LastCURequestDate");
        assert!(col.sortable);
        assert_eq!(col.remote_name.as_deref(), Some("LastCURequestDate"));
        assert!(!col.is_date_only());
    }

    #[test]
    fn test_column_type_serialization() {
        assert_eq!(
            serde_json::to_string(&ColumnType::Timestamp).unwrap(),
            "\"timestamp\""
        );
        assert_eq!(ColumnType::Json.to_string(), "json");
    }
}
