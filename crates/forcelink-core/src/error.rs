//! Typed errors for the forcelink engine.

use thiserror::Error;

/// Errors surfaced by list and get requests.
///
/// A record that does not exist is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum ForceError {
    /// The remote client could not be constructed (invalid or missing configuration).
    #[error("connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// The remote service rejected or failed a query, lookup or describe call.
    #[error("remote query failed: {0}")]
    RemoteQuery(String),

    /// A returned record could not be converted to the declared column types.
    #[error("failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A configuration value could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// No table is registered under the requested name.
    #[error("table not found: {0}")]
    UnknownTable(String),
}

impl ForceError {
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        ForceError::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForceError>;
