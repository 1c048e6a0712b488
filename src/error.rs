// src/error.rs
use thiserror::Error;

use crate::config::PlLine;
use crate::file::StoreError;

/// Input problems caught before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Name cannot be empty.")]
    EmptyName,

    #[error("Name must be at most {max} characters.")]
    NameTooLong { max: usize },

    #[error("{line} must be a valid number (got {value:?}).")]
    InvalidNumber { line: PlLine, value: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("You are not authorized to view this analysis.")]
    Unauthorized { id: String },

    #[error("Analysis not found.")]
    NotFound { id: String },

    #[error("Analysis {id} could not be read: {reason}")]
    MalformedDocument { id: String, reason: String },

    #[error("You need to sign in first.")]
    NotSignedIn,

    #[error("Storage unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DocumentNotFound { id, .. } => AppError::NotFound { id },
            other => AppError::StoreUnavailable(other),
        }
    }
}

impl AppError {
    /// Errors that replace the whole page rather than showing as an alert.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            AppError::Unauthorized { .. }
                | AppError::NotFound { .. }
                | AppError::MalformedDocument { .. }
        )
    }
}
