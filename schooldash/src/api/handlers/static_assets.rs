//! HTTP handler for embedded static assets.

use axum::{
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::static_assets::Assets;

/// `GET /static/{*path}`
#[instrument]
pub async fn serve_asset(Path(path): Path<String>) -> Response {
    let Some(content) = Assets::get(&path) else {
        debug!("No embedded asset at {path}");
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        content.data.into_owned(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use axum_test::TestServer;

    fn create_test_router() -> Router {
        Router::new().route("/static/{*path}", get(serve_asset))
    }

    #[tokio::test]
    async fn test_serve_stylesheet() {
        let server = TestServer::new(create_test_router()).unwrap();

        let response = server.get("/static/styles.css").await;

        response.assert_status(StatusCode::OK);
        assert!(
            response
                .headers()
                .get("content-type")
                .map(|v| v.to_str().unwrap())
                .unwrap()
                .starts_with("text/css")
        );
        assert_eq!(
            response.headers().get("cache-control").map(|v| v.to_str().unwrap()),
            Some("public, max-age=3600")
        );
    }

    #[tokio::test]
    async fn test_missing_asset_is_not_found() {
        let server = TestServer::new(create_test_router()).unwrap();

        server.get("/static/missing.js").await.assert_status(StatusCode::NOT_FOUND);
    }
}
