//! forcelink core - query pushdown and pagination engine
//!
//! Exposes remote CRM object types as tables:
//! - column naming conventions and the canonical <-> remote resolver
//! - schema merge of static declarations with introspected fields
//! - predicate, sort and limit pushdown into SOQL
//! - lazy paged row streams and typed record decoding

pub mod catalog;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod filter;
pub mod merge;
pub mod naming;
pub mod query;
pub mod registry;
pub mod schema;
pub mod stream;
pub mod table;

pub use client::{DescribedField, QueryPage, Record, RemoteClient};
pub use config::{ConnectionConfig, Credentials};
pub use decode::{Row, Value};
pub use error::{ForceError, Result};
pub use filter::{translate, FilterCondition, FilterOp, FilterValue, PushdownFilter};
pub use merge::{merge_schema, KeyColumn, MergedSchema};
pub use naming::{ColumnResolver, NamingConvention};
pub use query::{build_query, plan_query, ListRequest, QueryPlan, SortColumn, SortDirection};
pub use registry::TableRegistry;
pub use schema::{Column, ColumnType, TableSchema};
pub use stream::{stream_rows, RowStream};
pub use table::SObjectTable;
