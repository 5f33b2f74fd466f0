//! Table registry: builds every exposed table once per connection.

use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::static_tables;
use crate::client::{DescribedField, RemoteClient};
use crate::config::ConnectionConfig;
use crate::error::{ForceError, Result};
use crate::merge::merge_schema;
use crate::naming::to_snake_case;
use crate::table::SObjectTable;

/// Name of the table exposing an object type that has no built-in declaration.
pub fn dynamic_table_name(object_type: &str) -> String {
    format!("salesforce_{}", to_snake_case(object_type))
}

/// Introspect an object type. `None` when there is no client or the call fails.
async fn introspect(
    client: Option<&Arc<dyn RemoteClient>>,
    object_type: &str,
) -> Option<Vec<DescribedField>> {
    let client = client?;
    match client.describe(object_type).await {
        Ok(fields) => Some(fields),
        Err(e) => {
            warn!("Describing {} failed: {}", object_type, e);
            None
        }
    }
}

/// All tables exposed for one connection.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: Vec<Arc<SObjectTable>>,
}

impl TableRegistry {
    pub fn new(tables: Vec<Arc<SObjectTable>>) -> Self {
        Self { tables }
    }

    /// Build the built-in tables plus one table per configured object type.
    ///
    /// Built-in tables fall back to their static columns when introspection is
    /// unavailable. Configured object types are described by introspection
    /// alone, so one that cannot be described is skipped.
    pub async fn build(config: &ConnectionConfig, client: Option<Arc<dyn RemoteClient>>) -> Self {
        let convention = config.naming_convention;
        let mut tables = Vec::new();

        let builtin = static_tables();
        for declared in &builtin {
            let discovered = introspect(client.as_ref(), declared.object_type)
                .await
                .unwrap_or_default();
            let merged = merge_schema(&(declared.columns)(), &discovered, convention);
            info!(
                "Registered table '{}' -> {} ({} columns)",
                declared.name,
                declared.object_type,
                merged.schema.len()
            );
            tables.push(Arc::new(SObjectTable::new(
                declared.name,
                declared.object_type,
                declared.description,
                merged,
                client.clone(),
            )));
        }

        for object_type in &config.objects {
            if builtin
                .iter()
                .any(|t| t.object_type.eq_ignore_ascii_case(object_type))
            {
                continue;
            }
            let discovered = match introspect(client.as_ref(), object_type).await {
                Some(fields) if !fields.is_empty() => fields,
                _ => {
                    warn!(
                        "Skipping object {}: its fields could not be discovered",
                        object_type
                    );
                    continue;
                }
            };
            let name = dynamic_table_name(object_type);
            let merged = merge_schema(&[], &discovered, convention);
            info!(
                "Registered dynamic table '{}' -> {} ({} columns)",
                name,
                object_type,
                merged.schema.len()
            );
            tables.push(Arc::new(SObjectTable::new(
                &name,
                object_type,
                &format!("Represents the {} object.", object_type),
                merged,
                client.clone(),
            )));
        }

        Self { tables }
    }

    pub fn table(&self, name: &str) -> Result<Arc<SObjectTable>> {
        self.tables
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| ForceError::UnknownTable(name.to_string()))
    }

    pub fn tables(&self) -> &[Arc<SObjectTable>] {
        &self.tables
    }
}
