//! Error types shared by every pipeline stage.
//!
//! No stage recovers from its own failures. Errors propagate to the caller (the
//! binary or the in-process scheduler), which decides whether to retry.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Error)]
pub enum EtlError {
    /// Credentials missing, invalid or expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("network error: {0}")]
    TransientNetwork(String),

    /// The database endpoint could not be reached or the pool failed.
    #[error("database connection error: {0}")]
    Connection(String),

    /// The storage layer rejected the rows, usually because an existing table
    /// has an incompatible column set.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for EtlError {
    fn from(err: reqwest::Error) -> Self {
        EtlError::TransientNetwork(err.to_string())
    }
}

impl From<serde_json::Error> for EtlError {
    fn from(err: serde_json::Error) -> Self {
        EtlError::Parse(err.to_string())
    }
}

/// Extension trait for tagging sqlx failures with the stage they happened in.
pub trait SqlxErrExt<T> {
    /// Anything at this point means the server is unreachable or refused us.
    fn connection_err(self, context: &str) -> Result<T>;

    /// Statement-level rejections map to `SchemaMismatch`; transport failures stay
    /// `Connection`.
    fn storage_err(self, context: &str) -> Result<T>;
}

impl<T> SqlxErrExt<T> for std::result::Result<T, sqlx::Error> {
    fn connection_err(self, context: &str) -> Result<T> {
        self.map_err(|e| EtlError::Connection(format!("{}: {}", context, e)))
    }

    fn storage_err(self, context: &str) -> Result<T> {
        self.map_err(|e| match e {
            sqlx::Error::Database(db) => {
                EtlError::SchemaMismatch(format!("{}: {}", context, db))
            }
            other => EtlError::Connection(format!("{}: {}", context, other)),
        })
    }
}
