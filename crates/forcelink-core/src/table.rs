//! A remote object type exposed as a table with list and get capabilities.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::client::RemoteClient;
use crate::decode::{decode_record, Row};
use crate::error::{ForceError, Result};
use crate::filter::{FilterCondition, FilterOp, FilterValue};
use crate::merge::{KeyColumn, MergedSchema};
use crate::naming::ColumnResolver;
use crate::query::{plan_query, ListRequest, QueryPlan};
use crate::schema::TableSchema;
use crate::stream::{stream_rows, RowStream};

/// Table definition for one object type.
///
/// Schema and resolver are fixed at construction and shared read-only by
/// every request; each list or get call carries its own cursor state.
pub struct SObjectTable {
    name: String,
    object_type: String,
    description: String,
    schema: Arc<TableSchema>,
    resolver: Arc<ColumnResolver>,
    identifier: String,
    key_columns: Vec<KeyColumn>,
    client: Option<Arc<dyn RemoteClient>>,
}

impl fmt::Debug for SObjectTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SObjectTable")
            .field("name", &self.name)
            .field("object_type", &self.object_type)
            .field("columns", &self.schema.len())
            .field("identifier", &self.identifier)
            .field("connected", &self.client.is_some())
            .finish()
    }
}

impl SObjectTable {
    /// `client` is `None` when no remote client could be constructed; list
    /// and get then fail with `ConnectionUnavailable`.
    pub fn new(
        name: &str,
        object_type: &str,
        description: &str,
        merged: MergedSchema,
        client: Option<Arc<dyn RemoteClient>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            object_type: object_type.to_string(),
            description: description.to_string(),
            schema: Arc::new(merged.schema),
            resolver: Arc::new(merged.resolver),
            identifier: merged.identifier,
            key_columns: merged.key_columns,
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn resolver(&self) -> &ColumnResolver {
        &self.resolver
    }

    /// Column carrying the record identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Columns and operators list requests can push down.
    pub fn key_columns(&self) -> &[KeyColumn] {
        &self.key_columns
    }

    fn client(&self) -> Result<&Arc<dyn RemoteClient>> {
        self.client.as_ref().ok_or_else(|| {
            error!("No remote client configured for table {}", self.name);
            ForceError::ConnectionUnavailable(format!(
                "unable to query table {} because the connection configuration is invalid",
                self.name
            ))
        })
    }

    /// Plan the remote query for a list request without running it.
    pub fn plan(&self, request: &ListRequest) -> QueryPlan {
        plan_query(
            &self.object_type,
            request,
            &self.schema,
            &self.resolver,
            &self.identifier,
        )
    }

    /// Stream the rows matching `request`.
    ///
    /// Constraints and sort entries that cannot be pushed down are left out of
    /// the query, so the stream may contain rows the caller still has to
    /// filter out. The row cap in `request.limit` is always enforced.
    pub fn list(&self, request: &ListRequest) -> Result<RowStream> {
        let client = Arc::clone(self.client()?);
        debug!(
            "Listing {} with requested columns {:?}",
            self.name, request.columns
        );

        let plan = self.plan(request);
        if plan.dropped_conditions() > 0 || plan.dropped_sort > 0 {
            debug!(
                "Partial pushdown for {}: {} conditions and {} sort entries left to the caller",
                self.name, plan.dropped_conditions(), plan.dropped_sort
            );
        }

        Ok(stream_rows(
            client,
            plan.soql,
            plan.projection,
            Arc::clone(&self.resolver),
            request.limit,
        ))
    }

    /// Point lookup driven by an equality constraint on the identifier column.
    ///
    /// Without such a constraint the lookup is unsatisfiable and returns `None`.
    pub async fn get(&self, conditions: &[FilterCondition]) -> Result<Option<Row>> {
        let id = conditions
            .iter()
            .find(|c| c.column == self.identifier && c.op == FilterOp::Eq)
            .and_then(|c| match &c.value {
                FilterValue::String(s) => Some(s.as_str()),
                _ => None,
            })
            .unwrap_or("");
        self.get_by_id(id).await
    }

    /// Fetch a single record by identifier. `Ok(None)` when it does not exist.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Row>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        info!("Getting {} {} from {}", self.object_type, id, self.name);

        let client = self.client()?;
        let record = match client.get(&self.object_type, id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!("{} with id \"{}\" not found", self.object_type, id);
                return Ok(None);
            }
            Err(e) => {
                error!("Lookup of {} {} failed: {}", self.object_type, id, e);
                return Err(e);
            }
        };

        let row = decode_record(&record, self.schema.columns(), &self.resolver).map_err(|e| {
            error!("Decoding {} {} failed: {}", self.object_type, id, e);
            e
        })?;
        Ok(Some(row))
    }
}
