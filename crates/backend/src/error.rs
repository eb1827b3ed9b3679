use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;

/// Errors surfaced by the hosted backend.
///
/// `Conflict` carries the violated constraint name so callers can distinguish
/// the retryable duplicate-invoice-number case from other unique violations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not found")]
    NotFound,

    #[error("duplicate key value violates unique constraint \"{constraint}\"")]
    Conflict { constraint: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(String),
}

impl BackendError {
    pub fn conflict(constraint: impl Into<String>) -> Self {
        Self::Conflict {
            constraint: constraint.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True when this is a unique violation mentioning `column`
    /// (e.g. `purchases_invoice_no_key` for `invoice_no`).
    pub fn is_duplicate(&self, column: &str) -> bool {
        matches!(self, Self::Conflict { constraint } if constraint.contains(column))
    }
}
