//! forcelink CLI - query CRM objects as tables

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forcelink_core::decode::parse_timestamp;
use forcelink_core::{
    Column, ColumnType, ConnectionConfig, FilterCondition, FilterOp, FilterValue, ListRequest,
    QueryPlan, RemoteClient, Row, SortColumn, SortDirection, TableRegistry, TableSchema,
};
use forcelink_rest::RestClient;
use futures::StreamExt;
use serde_json::json;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "forcelink")]
#[command(about = "Query CRM objects as tables, with filters pushed down to the remote API")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the exposed tables
    Tables,

    /// Show the columns of a table and the operators usable in filters
    Describe {
        table: String,
    },

    /// Stream rows of a table as JSON lines
    List {
        table: String,

        /// Comma-separated columns to select (defaults to the identifier)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Constraint such as "industry = Technology" or "phone is null"; repeatable
        #[arg(short, long)]
        filter: Vec<String>,

        /// Sort entry as column[:asc|desc]; repeatable
        #[arg(short, long)]
        order_by: Vec<String>,

        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Fetch one record by identifier
    Get {
        table: String,
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the rows
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ConnectionConfig::from_env()?;
    let client: Option<Arc<dyn RemoteClient>> = match RestClient::connect(&config).await {
        Ok(client) => {
            info!("Connected to {}", client.instance_url());
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("No remote connection, tables expose static columns only: {}", e);
            None
        }
    };
    let registry = TableRegistry::build(&config, client).await;

    match cli.command {
        Commands::Tables => show_tables(&registry),
        Commands::Describe { table } => describe_table(&registry, &table)?,
        Commands::List {
            table,
            columns,
            filter,
            order_by,
            limit,
        } => list_rows(&registry, &table, columns, &filter, &order_by, limit).await?,
        Commands::Get { table, id } => get_row(&registry, &table, &id).await?,
    }

    Ok(())
}

fn show_tables(registry: &TableRegistry) {
    for table in registry.tables() {
        println!(
            "{}",
            json!({
                "name": table.name(),
                "object_type": table.object_type(),
                "description": table.description(),
                "columns": table.schema().len(),
            })
        );
    }
}

fn describe_table(registry: &TableRegistry, name: &str) -> Result<()> {
    let table = registry.table(name)?;
    for column in table.schema().columns() {
        let operators = table
            .key_columns()
            .iter()
            .find(|k| k.name == column.name)
            .map(|k| k.operators.clone())
            .unwrap_or_default();
        println!(
            "{}",
            json!({
                "name": column.name,
                "type": column.column_type,
                "remote_name": table.resolver().remote_name(&column.name),
                "sortable": column.sortable,
                "operators": operators,
                "description": column.description,
            })
        );
    }
    Ok(())
}

async fn list_rows(
    registry: &TableRegistry,
    name: &str,
    columns: Vec<String>,
    filters: &[String],
    order_by: &[String],
    limit: Option<usize>,
) -> Result<()> {
    let table = registry.table(name)?;

    let mut request = ListRequest {
        columns,
        limit,
        ..Default::default()
    };
    for expr in filters {
        request = request.filter(parse_filter(expr, table.schema())?);
    }
    for entry in order_by {
        request = request.order_by(parse_sort(entry)?);
    }

    let plan = table.plan(&request);
    let output: Vec<String> = plan.projection.iter().map(|c| c.name.clone()).collect();
    let request = fetch_request(request, &plan);
    if plan.dropped_conditions() > 0 {
        warn!(
            "{} filter(s) could not be pushed down and are applied locally",
            plan.dropped_conditions()
        );
    }
    info!("Query: {}", table.plan(&request).soql);

    let mut count = 0usize;
    if limit == Some(0) {
        info!("0 rows");
        return Ok(());
    }
    let mut rows = table.list(&request)?;
    while let Some(row) = rows.next().await {
        let row = row?;
        if !plan.accepts(&row) {
            continue;
        }
        println!("{}", serde_json::to_string(&select(&row, &output))?);
        count += 1;
        if limit == Some(count) {
            break;
        }
    }
    info!("{} rows", count);
    Ok(())
}

/// The request actually sent: constraints left for local evaluation need
/// their columns fetched, and the row cap moves to the local side.
fn fetch_request(mut request: ListRequest, plan: &QueryPlan) -> ListRequest {
    if plan.residual_conditions.is_empty() {
        return request;
    }
    request.columns = plan.projection.iter().map(|c| c.name.clone()).collect();
    for condition in &plan.residual_conditions {
        if !request.columns.contains(&condition.column) {
            request.columns.push(condition.column.clone());
        }
    }
    request.limit = None;
    request
}

/// Keep only the `output` columns of a row, in order.
fn select(row: &Row, output: &[String]) -> serde_json::Value {
    let cells: serde_json::Map<String, serde_json::Value> = output
        .iter()
        .map(|name| {
            let value = row
                .get(name)
                .and_then(|v| serde_json::to_value(v).ok())
                .unwrap_or(serde_json::Value::Null);
            (name.clone(), value)
        })
        .collect();
    serde_json::Value::Object(cells)
}

async fn get_row(registry: &TableRegistry, name: &str, id: &str) -> Result<()> {
    let table = registry.table(name)?;
    match table.get_by_id(id).await? {
        Some(row) => println!("{}", serde_json::to_string(&row)?),
        None => anyhow::bail!("No {} record with id '{}'", table.object_type(), id),
    }
    Ok(())
}

/// Parse `column op value`. Values are typed by the column's declared type.
fn parse_filter(expr: &str, schema: &TableSchema) -> Result<FilterCondition> {
    let expr = expr.trim();
    let (column, rest) = expr
        .split_once(char::is_whitespace)
        .with_context(|| format!("Filter '{}' must look like 'column op value'", expr))?;
    let rest = rest.trim();
    if schema.column(column).is_none() {
        anyhow::bail!("Unknown column '{}' in filter '{}'", column, expr);
    }

    let lowered = rest.to_lowercase();
    if lowered == "is null" {
        return Ok(FilterCondition::new(column, FilterOp::IsNull, FilterValue::Null));
    }
    if lowered == "is not null" {
        return Ok(FilterCondition::new(column, FilterOp::IsNotNull, FilterValue::Null));
    }

    let (op_token, raw) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let op = match op_token.to_lowercase().as_str() {
        "=" | "==" => FilterOp::Eq,
        "!=" | "<>" => FilterOp::Neq,
        "<" => FilterOp::Lt,
        "<=" => FilterOp::Lte,
        ">" => FilterOp::Gt,
        ">=" => FilterOp::Gte,
        "in" => FilterOp::In,
        other => anyhow::bail!("Unknown operator '{}' in filter '{}'", other, expr),
    };

    let raw = raw.trim();
    let value = if op == FilterOp::In {
        FilterValue::StringList(
            raw.split(',')
                .map(|v| unquote(v.trim()).to_string())
                .filter(|v| !v.is_empty())
                .collect(),
        )
    } else {
        typed_value(schema.column(column), unquote(raw))?
    };
    Ok(FilterCondition::new(column, op, value))
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(s)
}

fn typed_value(column: Option<&Column>, raw: &str) -> Result<FilterValue> {
    if raw.eq_ignore_ascii_case("null") {
        return Ok(FilterValue::Null);
    }
    let column_type = column.map(|c| c.column_type).unwrap_or(ColumnType::String);
    let value = match column_type {
        ColumnType::Double => FilterValue::Number(
            raw.parse::<f64>()
                .with_context(|| format!("'{}' is not a number", raw))?,
        ),
        ColumnType::Boolean => FilterValue::Bool(
            raw.parse::<bool>()
                .with_context(|| format!("'{}' is not true or false", raw))?,
        ),
        ColumnType::Timestamp => FilterValue::Timestamp(
            parse_timestamp(raw).map_err(anyhow::Error::msg)?,
        ),
        ColumnType::String | ColumnType::Json => FilterValue::string(raw),
    };
    Ok(value)
}

/// Parse `column[:asc|desc]`.
fn parse_sort(entry: &str) -> Result<SortColumn> {
    let (column, direction) = match entry.split_once(':') {
        Some((column, dir)) => match dir.to_lowercase().as_str() {
            "asc" => (column, SortDirection::Asc),
            "desc" => (column, SortDirection::Desc),
            other => anyhow::bail!("Unknown sort direction '{}'", other),
        },
        None => (entry, SortDirection::Asc),
    };
    Ok(SortColumn {
        column: column.trim().to_string(),
        direction,
    })
}
