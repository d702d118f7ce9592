//! # schooldash: School Administration Dashboard
//!
//! `schooldash` is a server-rendered web application for running the records of a small school:
//! students, teachers, classes and announcements. Every page is plain HTML rendered on the
//! server; forms post back and either redirect to the list on success or re-render it with a
//! message and the submitted values.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! PostgreSQL for persistence. Templates are compiled into the binary with
//! [minijinja](https://docs.rs/minijinja), and so is the stylesheet.
//!
//! ### Request Flow
//!
//! A page request first passes through [`api::middleware::attach_database`], which resolves the
//! shared connection pool (connecting and migrating on first use) and hands it to the handler.
//! The handler validates the form, talks to the database through the repositories in
//! [`db::handlers`], and renders a template through [`views::Views`].
//!
//! ### Seats
//!
//! Each student holds a seat in one class of its grade. Seats are allocated to the least-filled
//! class with room left, under a row lock, so concurrent admissions never overfill a class. See
//! [`db::handlers::Seats`].
//!
//! ## Modules
//!
//! - [`api`]: HTTP handlers, form models and middleware
//! - [`db`]: Connection handling, repositories and list query building
//! - [`config`]: Configuration loading from YAML and environment variables
//! - [`views`]: Page templates
//! - [`errors`]: Error types and their mapping to HTTP responses
//! - [`telemetry`]: Tracing and optional OpenTelemetry export
//!
//! ## Getting Started
//!
//! ```bash
//! DATABASE_URL=postgres://localhost:5432/schooldash cargo run
//! ```
//!
//! The server listens on port 8080 by default; see [`config::Config`] for every setting.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
mod static_assets;
pub mod telemetry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod views;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bon::Builder;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

use crate::api::handlers::{announcements, classes, dashboard, static_assets as assets, students, teachers};
pub use config::Config;
pub use db::Database;
pub use errors::{Error, Result};
pub use types::AnnouncementType;
use views::Views;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(Database::from_pool(pool))
///     .config(config)
///     .views(Arc::new(Views::new()?))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub views: Arc<Views>,
}

/// Get the schooldash database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the application router.
///
/// Page routes run behind [`api::middleware::attach_database`]; the health check and static
/// assets don't touch the database.
pub fn build_router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(dashboard::home))
        .route("/students", get(students::list_students))
        .route("/students/add", post(students::add_student))
        .route("/students/update/{id}", post(students::update_student))
        .route("/students/delete/{id}", post(students::delete_student))
        .route("/teachers", get(teachers::list_teachers))
        .route("/teachers/add", post(teachers::add_teacher))
        .route("/teachers/update/{id}", post(teachers::update_teacher))
        .route("/teachers/delete/{id}", post(teachers::delete_teacher))
        .route("/classes", get(classes::list_classes))
        .route("/classes/add", post(classes::add_class))
        .route("/classes/update/{id}", post(classes::update_class))
        .route("/classes/delete/{id}", post(classes::delete_class))
        .route("/announcements", get(announcements::list_announcements))
        .route("/announcements/add", post(announcements::add_announcement))
        .route("/announcements/update/{id}", post(announcements::update_announcement))
        .route("/announcements/delete/{id}", post(announcements::delete_announcement))
        .route_layer(from_fn_with_state(state.clone(), api::middleware::attach_database));

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/static/{*path}", get(assets::serve_asset))
        .merge(pages)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// The dashboard server.
///
/// 1. **Create**: [`Application::new`] compiles the templates and connects to the database,
///    running migrations
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, in-flight requests finish, then the pool
///    and telemetry are closed
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
}

impl Application {
    /// Create a new application instance, connecting to the configured database.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting schooldash with configuration: {:#?}", config);

        let db = Database::new(config.database.url.clone(), config.database.pool.clone());
        db.init().await?;

        Self::with_database(config, db)
    }

    /// Create an application around an existing, migrated pool.
    pub fn from_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        Self::with_database(config, Database::from_pool(pool))
    }

    fn with_database(config: Config, db: Database) -> anyhow::Result<Self> {
        let app_state = AppState::builder()
            .db(db)
            .config(config.clone())
            .views(Arc::new(Views::new()?))
            .build();
        let router = build_router(app_state.clone());

        Ok(Self {
            router,
            app_state,
            config,
        })
    }

    /// Convert application into a test server
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "schooldash listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.app_state.db.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
