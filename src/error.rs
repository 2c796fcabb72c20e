//! Error types for the budget store and expense workflow

use thiserror::Error;

use crate::models::ExpenseStatus;
use crate::workflow::ExpenseAction;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("Event '{0}' already exists")]
    ConstraintViolation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Expense {id} is {status}; cannot {action}")]
    InvalidState {
        id: i64,
        status: ExpenseStatus,
        action: ExpenseAction,
    },

    #[error("Incorrect approval password")]
    Unauthorized,

    #[error("Invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    pub(crate) fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
