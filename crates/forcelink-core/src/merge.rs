//! Schema merge: static column declarations + introspected remote fields.

use tracing::{debug, warn};

use crate::client::DescribedField;
use crate::filter::FilterOp;
use crate::naming::{to_camel_case, ColumnResolver, NamingConvention};
use crate::schema::{Column, ColumnType, TableSchema};

/// A column usable in list pushdown, with the operators the remote side accepts for it.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyColumn {
    pub name: String,
    pub operators: Vec<FilterOp>,
}

/// Effective schema of a table plus everything derived from it at construction time.
#[derive(Debug, Clone)]
pub struct MergedSchema {
    pub schema: TableSchema,
    pub resolver: ColumnResolver,
    /// Column carrying the record identifier (`id` or `Id`).
    pub identifier: String,
    pub key_columns: Vec<KeyColumn>,
}

/// Map a remote field type to the semantic column type.
pub fn column_type_for(field_type: &str) -> ColumnType {
    match field_type.to_lowercase().as_str() {
        "id" | "string" | "reference" | "picklist" | "multipicklist" | "textarea" | "phone"
        | "url" | "email" | "combobox" | "encryptedstring" | "base64" | "time" => {
            ColumnType::String
        }
        "double" | "currency" | "percent" | "int" | "long" => ColumnType::Double,
        "boolean" => ColumnType::Boolean,
        "date" | "datetime" => ColumnType::Timestamp,
        _ => ColumnType::Json,
    }
}

/// Operators pushdown supports for a column type.
pub fn supported_operators(column_type: ColumnType) -> Vec<FilterOp> {
    match column_type {
        ColumnType::String => vec![
            FilterOp::Eq,
            FilterOp::Neq,
            FilterOp::In,
            FilterOp::IsNull,
            FilterOp::IsNotNull,
        ],
        ColumnType::Boolean => vec![
            FilterOp::Eq,
            FilterOp::Neq,
            FilterOp::IsNull,
            FilterOp::IsNotNull,
        ],
        ColumnType::Double | ColumnType::Timestamp => vec![
            FilterOp::Eq,
            FilterOp::Neq,
            FilterOp::Lt,
            FilterOp::Lte,
            FilterOp::Gt,
            FilterOp::Gte,
            FilterOp::IsNull,
            FilterOp::IsNotNull,
        ],
        ColumnType::Json => vec![],
    }
}

/// Merge statically declared columns with introspected fields.
///
/// Static declarations are written in snake_case and take precedence on a
/// name collision; they absorb the remote spelling and remote type of the
/// matching introspected field. Introspected fields with no static
/// counterpart are appended in remote order. Pass an empty `discovered`
/// slice when introspection is unavailable.
pub fn merge_schema(
    static_columns: &[Column],
    discovered: &[DescribedField],
    convention: NamingConvention,
) -> MergedSchema {
    let mut resolver = ColumnResolver::new(convention);
    let mut schema = TableSchema::default();

    // snake_case name -> introspected field, used to pin static columns to the real spelling
    let by_snake: Vec<(String, &DescribedField)> = discovered
        .iter()
        .map(|f| (NamingConvention::SnakeCase.canonical_for(&f.name), f))
        .collect();

    for declared in static_columns {
        let found = by_snake
            .iter()
            .find(|(snake, _)| *snake == declared.name)
            .map(|(_, f)| *f);

        let remote = match (found, &declared.remote_name) {
            (Some(field), _) => field.name.clone(),
            (None, Some(pinned)) => pinned.clone(),
            (None, None) => to_camel_case(&declared.name),
        };

        let mut column = declared.clone();
        column.name = match convention {
            NamingConvention::SnakeCase => declared.name.clone(),
            NamingConvention::ApiNative => remote.clone(),
        };
        // metadata can only narrow what is pushed down
        column.sortable = declared.sortable && found.map_or(true, |f| f.sortable);
        column.filterable = declared.filterable && found.map_or(true, |f| f.filterable);
        column.remote_type = found.map(|f| f.field_type.to_lowercase());
        column.remote_name = Some(remote.clone());

        if !resolver.insert(&column.name, &remote) {
            warn!(
                "Skipping declared column '{}': remote field '{}' already mapped",
                column.name, remote
            );
            continue;
        }
        schema.push(column);
    }

    for field in discovered {
        let canonical = convention.canonical_for(&field.name);
        if schema.column(&canonical).is_some() {
            continue;
        }
        if !resolver.insert(&canonical, &field.name) {
            warn!(
                "Skipping discovered field '{}': canonical name '{}' already in use",
                field.name, canonical
            );
            continue;
        }
        let description = if field.label.is_empty() {
            format!("The {}.", field.name)
        } else {
            format!("The {}.", field.label)
        };
        let mut column = Column::new(&canonical, column_type_for(&field.field_type), &description);
        column.sortable = field.sortable;
        column.filterable = field.filterable;
        column.remote_name = Some(field.name.clone());
        column.remote_type = Some(field.field_type.to_lowercase());
        schema.push(column);
    }

    let key_columns = schema
        .columns()
        .iter()
        .filter(|c| c.filterable)
        .map(|c| KeyColumn {
            name: c.name.clone(),
            operators: supported_operators(c.column_type),
        })
        .filter(|k| !k.operators.is_empty())
        .collect();

    debug!(
        "Merged schema: {} static, {} discovered -> {} columns ({})",
        static_columns.len(),
        discovered.len(),
        schema.len(),
        convention
    );

    MergedSchema {
        schema,
        resolver,
        identifier: convention.identifier_column().to_string(),
        key_columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, field_type: &str) -> DescribedField {
        DescribedField {
            name: name.to_string(),
            field_type: field_type.to_string(),
            label: String::new(),
            filterable: true,
            sortable: false,
        }
    }

    fn static_columns() -> Vec<Column> {
        vec![
            Column::new("id", ColumnType::String, "Unique identifier."),
            Column::new("name", ColumnType::String, "Name of the contact."),
            Column::new("last_cu_request_date", ColumnType::Timestamp, "Last request.")
                .sortable()
                .remote("LastCURequestDate"),
            Column::new("mailing_address", ColumnType::Json, "Mailing address."),
        ]
    }

    #[test]
    fn test_column_type_for() {
        assert_eq!(column_type_for("picklist"), ColumnType::String);
        assert_eq!(column_type_for("reference"), ColumnType::String);
        assert_eq!(column_type_for("currency"), ColumnType::Double);
        assert_eq!(column_type_for("int"), ColumnType::Double);
        assert_eq!(column_type_for("boolean"), ColumnType::Boolean);
        assert_eq!(column_type_for("date"), ColumnType::Timestamp);
        assert_eq!(column_type_for("datetime"), ColumnType::Timestamp);
        assert_eq!(column_type_for("time"), ColumnType::String);
        assert_eq!(column_type_for("address"), ColumnType::Json);
        assert_eq!(column_type_for("location"), ColumnType::Json);
    }

    #[test]
    fn test_static_only_snake_case() {
        let merged = merge_schema(&static_columns(), &[], NamingConvention::SnakeCase);
        assert_eq!(merged.schema.len(), 4);
        assert_eq!(merged.identifier, "id");
        assert_eq!(merged.resolver.remote_name("id"), "Id");
        assert_eq!(
            merged.resolver.remote_name("last_cu_request_date"),
            "LastCURequestDate"
        );
        assert_eq!(
            merged.resolver.remote_name("mailing_address"),
            "MailingAddress"
        );
    }

    #[test]
    fn test_static_precedence_on_collision() {
        let discovered = vec![
            DescribedField {
                label: "Full Name".to_string(),
                ..field("Name", "string")
            },
            field("Department", "string"),
        ];
        let merged = merge_schema(&static_columns(), &discovered, NamingConvention::SnakeCase);
        let name = merged.schema.column("name").unwrap();
        assert_eq!(name.description, "Name of the contact.");
        assert_eq!(name.remote_type.as_deref(), Some("string"));
        let dept = merged.schema.column("department").unwrap();
        assert_eq!(dept.description, "The Department.");
        assert_eq!(merged.schema.len(), 5);
    }

    #[test]
    fn test_discovered_spelling_wins_over_derived() {
        let discovered = vec![field("LastCUUpdateDate", "datetime")];
        let declared = vec![Column::new(
            "last_cu_update_date",
            ColumnType::Timestamp,
            "Last save.",
        )];
        let merged = merge_schema(&declared, &discovered, NamingConvention::SnakeCase);
        assert_eq!(merged.schema.len(), 1);
        assert_eq!(
            merged.resolver.remote_name("last_cu_update_date"),
            "LastCUUpdateDate"
        );
    }

    #[test]
    fn test_api_native_uses_remote_spelling() {
        let discovered = vec![field("Region__c", "picklist")];
        let merged = merge_schema(&static_columns(), &discovered, NamingConvention::ApiNative);
        assert_eq!(merged.identifier, "Id");
        assert!(merged.schema.column("Id").is_some());
        assert!(merged.schema.column("LastCURequestDate").is_some());
        assert!(merged.schema.column("Region__c").is_some());
        assert!(merged.schema.column("id").is_none());
        assert_eq!(merged.resolver.remote_name("Region__c"), "Region__c");
    }

    #[test]
    fn test_round_trip_every_column_both_conventions() {
        let discovered = vec![
            field("Pricebook2Id", "reference"),
            field("Region__c", "picklist"),
            field("LastCURequestDate", "datetime"),
        ];
        for convention in [NamingConvention::SnakeCase, NamingConvention::ApiNative] {
            let merged = merge_schema(&static_columns(), &discovered, convention);
            for column in merged.schema.columns() {
                let remote = merged.resolver.remote_name(&column.name);
                assert_eq!(
                    merged.resolver.canonical_name(remote),
                    column.name,
                    "round trip failed for {} under {}",
                    column.name,
                    convention
                );
            }
        }
    }

    #[test]
    fn test_date_only_remote_type_is_kept() {
        let discovered = vec![DescribedField {
            sortable: true,
            ..field("EffectiveDate", "date")
        }];
        let declared = vec![Column::new("effective_date", ColumnType::Timestamp, "d").sortable()];
        let merged = merge_schema(&declared, &discovered, NamingConvention::SnakeCase);
        let column = merged.schema.column("effective_date").unwrap();
        assert!(column.is_date_only());
        assert!(column.sortable);
    }

    #[test]
    fn test_key_columns_skip_json_and_unfilterable() {
        let discovered = vec![DescribedField {
            filterable: false,
            ..field("Description", "textarea")
        }];
        let merged = merge_schema(&static_columns(), &discovered, NamingConvention::SnakeCase);
        let names: Vec<&str> = merged.key_columns.iter().map(|k| k.name.as_str()).collect();
        assert!(names.contains(&"id"));
        assert!(!names.contains(&"mailing_address"));
        assert!(!names.contains(&"description"));
        let dated = merged
            .key_columns
            .iter()
            .find(|k| k.name == "last_cu_request_date")
            .unwrap();
        assert!(dated.operators.contains(&FilterOp::Gte));
    }

    #[test]
    fn test_metadata_narrows_static_flags() {
        let discovered = vec![
            DescribedField {
                filterable: false,
                sortable: false,
                ..field("Name", "textarea")
            },
            field("LastCURequestDate", "datetime"),
        ];
        let merged = merge_schema(&static_columns(), &discovered, NamingConvention::SnakeCase);

        let name = merged.schema.column("name").unwrap();
        assert!(!name.filterable);
        assert!(!merged.key_columns.iter().any(|k| k.name == "name"));

        // declared sortable, but the remote side says otherwise
        let dated = merged.schema.column("last_cu_request_date").unwrap();
        assert!(!dated.sortable);
        assert!(dated.filterable);
    }

    #[test]
    fn test_metadata_never_widens_static_flags() {
        let discovered = vec![DescribedField {
            sortable: true,
            ..field("Id", "id")
        }];
        let merged = merge_schema(&static_columns(), &discovered, NamingConvention::SnakeCase);
        assert!(!merged.schema.column("id").unwrap().sortable);
        // no metadata at all keeps the declarations
        let merged = merge_schema(&static_columns(), &[], NamingConvention::SnakeCase);
        assert!(merged.schema.column("last_cu_request_date").unwrap().sortable);
        assert!(merged.schema.column("name").unwrap().filterable);
    }
}
