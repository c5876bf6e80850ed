// error.rs
// Error taxonomy shared by every registry, the payroll ledger and the store.

use thiserror::Error;

use crate::models::PayrollState;

/// Coarse classification used by callers that only care about the family of
/// a failure (not found, bad input or broken storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Storage,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("payroll {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: PayrollState,
        to: PayrollState,
    },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("stored collection {slot} is corrupt")]
    Storage {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot access stored collection {slot}")]
    Io {
        slot: String,
        #[source]
        source: std::io::Error,
    },

    /// The file handed to an upload could not be read; nothing was stored.
    #[error("cannot read uploaded file {file}")]
    Upload {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::Validation(_)
            | AppError::InvalidTransition { .. }
            | AppError::Forbidden(_)
            | AppError::Upload { .. } => ErrorKind::Validation,
            AppError::Storage { .. } | AppError::Io { .. } => ErrorKind::Storage,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
