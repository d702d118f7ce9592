//! Request middleware.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::AppState;

/// Resolve the shared pool (connecting on first use) and make it available to handlers as an
/// `Extension<PgPool>`. Answers 500 without running the handler when no connection can be made.
pub async fn attach_database(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match state.db.pool().await {
        Ok(pool) => {
            request.extensions_mut().insert(pool);
            next.run(request).await
        }
        Err(err) => {
            error!("Database connection failed: {:#}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Unable to connect to database.").into_response()
        }
    }
}
