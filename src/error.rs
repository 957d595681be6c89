//! Engine error type
//!
//! One error enum for the whole crate. Validation and business-rule
//! failures carry enough context to build a caller-facing message; storage
//! failures wrap `sqlx::Error` directly.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    // Field names avoid `source`, which thiserror reserves for error causes
    #[error("currency mismatch between wallets: {expected} vs {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error("insufficient balance in wallet {0}")]
    InsufficientBalance(String),

    #[error("daily transfer limit exceeded: limit {limit}, already used {used}")]
    DailyLimitExceeded { limit: Decimal, used: Decimal },

    #[error("conflict: {0}")]
    Conflict(String),
}

impl EngineError {
    /// Stable machine-readable kind, used for audit payloads and logs
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Database(_) => "DATABASE_ERROR",
            EngineError::InvalidRequest(_) => "INVALID_REQUEST",
            EngineError::NotFound(_) => "NOT_FOUND",
            EngineError::InvalidState(_) => "INVALID_STATE",
            EngineError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            EngineError::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            EngineError::DailyLimitExceeded { .. } => "DAILY_LIMIT_EXCEEDED",
            EngineError::Conflict(_) => "CONFLICT",
        }
    }
}
