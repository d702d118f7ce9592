//! Axum handlers for every route.
//!
//! Form handlers share a few helpers defined here: acquiring a connection, mapping storage
//! errors from a write onto the form's messages, and releasing seats on a best-effort basis.

pub mod announcements;
pub mod classes;
pub mod dashboard;
pub mod static_assets;
pub mod students;
pub mod teachers;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use sqlx::{PgConnection, PgPool, Postgres, pool::PoolConnection};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::db::{errors::DbError, handlers::Seats};
use crate::errors::{Error, Result};
use crate::types::{ClassId, abbrev_uuid};

pub(crate) async fn acquire(pool: &PgPool) -> Result<PoolConnection<Postgres>> {
    pool.acquire().await.map_err(|e| Error::Database(e.into()))
}

/// Parse a record id from a path or query value.
pub(crate) fn parse_record_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// A write tripped a unique index: report it like the advisory duplicate check would have.
pub(crate) fn conflict_on_unique(err: DbError, message: &str) -> Error {
    if err.is_unique_violation() {
        Error::Conflict {
            message: message.to_string(),
        }
    } else {
        Error::Database(err)
    }
}

/// Give a seat back, logging instead of failing. Used where the primary outcome is already
/// decided and a failed release must not mask it.
pub(crate) async fn release_seat(conn: &mut PgConnection, class_id: ClassId) {
    match Seats::new(conn).release(class_id).await {
        Ok(true) => {}
        Ok(false) => warn!(class_id = %abbrev_uuid(&class_id), "Seat release found nothing to release"),
        Err(err) => error!(class_id = %abbrev_uuid(&class_id), "Failed to release seat: {:#}", err),
    }
}

/// Log a failed write by severity. Infrastructure causes are logged in full because the page
/// only shows a generic message for them.
pub(crate) fn log_write_failure(action: &str, err: &Error) {
    if err.is_infrastructure() {
        error!("Failed to {action}: {:#}", err);
    } else {
        debug!("Rejected {action}: {}", err);
    }
}

/// Log why a page could not be built and replace the cause with the page's generic message.
pub(crate) fn load_failure(page: &str, err: Error) -> Error {
    error!("Failed to load {page} page: {:#}", err);
    Error::Internal {
        operation: format!("load {page} page"),
    }
}

pub(crate) fn html(status: StatusCode, body: String) -> Response {
    (status, Html(body)).into_response()
}
