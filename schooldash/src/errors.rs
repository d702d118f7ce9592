use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Missing or malformed form field
    #[error("{message}")]
    Validation { message: String },

    /// Duplicate unique key
    #[error("{message}")]
    Conflict { message: String },

    /// Requested record not found (stale identifier on update)
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// No class of the requested grade has a free seat
    #[error("No available seats found in Class {grade}.")]
    CapacityExhausted { grade: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::CapacityExhausted { .. } => StatusCode::CONFLICT,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error is caused by infrastructure rather than by what the user submitted.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Error::Internal { .. } | Error::Database(_) | Error::Other(_)
        )
    }

    /// Whether a form should be discarded after this error instead of being shown again.
    ///
    /// A stale identifier on update leaves nothing meaningful to edit.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Message to show above a form after a failed write.
    ///
    /// User-caused errors are shown verbatim. Infrastructure errors are replaced by `fallback`, so
    /// database details never reach the page.
    pub fn form_message(&self, fallback: &str) -> String {
        match self {
            Error::Validation { message } | Error::Conflict { message } => message.clone(),
            Error::NotFound { resource, .. } => format!("{resource} not found for update."),
            Error::CapacityExhausted { .. } => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { message } | Error::Conflict { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::CapacityExhausted { .. } => self.to_string(),
            Error::Internal { operation } => format!("Unable to {operation}."),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Validation { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } | Error::CapacityExhausted { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
