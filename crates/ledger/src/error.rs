//! Ledger error types.

use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// SQLx error (connection, query, etc.)
    #[error("ledger database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
