//! SOQL assembly: projection, filter, sort and limit pushdown.

use serde::Deserialize;
use tracing::debug;

use crate::decode::Row;
use crate::filter::{translate, FilterCondition};
use crate::naming::ColumnResolver;
use crate::schema::{Column, ColumnType, TableSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SortColumn {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortColumn {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// A list request against one table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRequest {
    /// Requested output columns; empty selects only the identifier.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    #[serde(default)]
    pub sort: Vec<SortColumn>,
    /// Hard cap on rows streamed; also pushed down as `LIMIT`.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ListRequest {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, sort: SortColumn) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The planned remote query for a list request.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub soql: String,
    /// Columns each returned record is decoded into, in output order.
    pub projection: Vec<Column>,
    /// Constraints not pushed down; the caller re-checks them.
    pub residual_conditions: Vec<FilterCondition>,
    /// Sort entries not pushed down.
    pub dropped_sort: usize,
}

impl QueryPlan {
    pub fn dropped_conditions(&self) -> usize {
        self.residual_conditions.len()
    }

    /// True when every returned row satisfies the constraints left out of the query.
    pub fn accepts(&self, row: &Row) -> bool {
        self.residual_conditions.iter().all(|c| c.matches(row))
    }
}

/// Resolve the requested columns against the schema.
///
/// Unknown names are ignored and duplicates collapse. When nothing remains,
/// the identifier column is selected so the query stays valid.
pub fn projection<S: AsRef<str>>(
    schema: &TableSchema,
    requested: &[S],
    identifier: &str,
) -> Vec<Column> {
    let mut selected: Vec<Column> = Vec::with_capacity(requested.len());
    for name in requested {
        if let Some(column) = schema.column(name.as_ref()) {
            if !selected.iter().any(|c| c.name == column.name) {
                selected.push(column.clone());
            }
        }
    }

    if selected.is_empty() {
        let id = schema
            .column(identifier)
            .cloned()
            .unwrap_or_else(|| Column::new(identifier, ColumnType::String, "Identifier."));
        selected.push(id);
    }
    selected
}

/// `ORDER BY` terms for the sort entries that can be pushed down.
fn sort_terms(sort: &[SortColumn], schema: &TableSchema, resolver: &ColumnResolver) -> Vec<String> {
    sort.iter()
        .filter_map(|entry| {
            let column = schema.column(&entry.column).filter(|c| c.sortable)?;
            Some(format!(
                "{} {}",
                resolver.remote_name(&column.name),
                entry.direction.keyword()
            ))
        })
        .collect()
}

/// Assemble a SOQL query string.
///
/// `filter` is a translated expression without the `WHERE` keyword. Sort
/// entries on columns not marked sortable are skipped.
pub fn build_query(
    object_type: &str,
    projection: &[Column],
    filter: &str,
    sort: &[SortColumn],
    limit: Option<usize>,
    schema: &TableSchema,
    resolver: &ColumnResolver,
) -> String {
    let fields = projection
        .iter()
        .map(|c| resolver.remote_name(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut soql = format!("SELECT {} FROM {}", fields, object_type);

    if !filter.is_empty() {
        soql.push_str(" WHERE ");
        soql.push_str(filter);
    }

    let terms = sort_terms(sort, schema, resolver);
    if !terms.is_empty() {
        soql.push_str(" ORDER BY ");
        soql.push_str(&terms.join(", "));
    }

    if let Some(limit) = limit {
        soql.push_str(&format!(" LIMIT {}", limit));
    }

    soql
}

/// Plan a list request: projection, translated filter, sort and limit.
pub fn plan_query(
    object_type: &str,
    request: &ListRequest,
    schema: &TableSchema,
    resolver: &ColumnResolver,
    identifier: &str,
) -> QueryPlan {
    let projection = projection(schema, &request.columns, identifier);
    let filter = translate(&request.conditions, schema, resolver);
    let pushed_sort = sort_terms(&request.sort, schema, resolver).len();

    let soql = build_query(
        object_type,
        &projection,
        &filter.expression,
        &request.sort,
        request.limit,
        schema,
        resolver,
    );

    let plan = QueryPlan {
        soql,
        projection,
        residual_conditions: filter.residual,
        dropped_sort: request.sort.len() - pushed_sort,
    };

    debug!(
        "Planned query for {}: {} (dropped {} conditions, {} sort entries)",
        object_type,
        plan.soql,
        plan.dropped_conditions(),
        plan.dropped_sort
    );
    plan
}
