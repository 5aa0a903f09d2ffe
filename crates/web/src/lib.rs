//! Border registry web server and REST API.
//!
//! Provides an Axum-based HTTP server with:
//! - `POST /` to record a crossing (upsert-and-merge)
//! - `GET /last` for the most recently stored records
//! - `GET /health` for liveness checks

pub mod api;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use chrono::NaiveDateTime;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use border_registry_core::config::AppConfig;
use border_registry_core::db::Database;
use border_registry_core::merger::local_now;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    /// Stamps each recorded crossing.
    pub clock: fn() -> NaiveDateTime,
}

/// The web server.
pub struct WebServer {
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server around an already initialized store.
    pub fn new(config: AppConfig, db: Database) -> Self {
        Self::with_clock(config, db, local_now)
    }

    /// Like [`WebServer::new`], with crossings stamped by `clock`.
    pub fn with_clock(config: AppConfig, db: Database, clock: fn() -> NaiveDateTime) -> Self {
        Self {
            state: Arc::new(AppState { db, config, clock }),
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve on `listen_addr` until `shutdown` resolves.
    pub async fn start<F>(self, listen_addr: &str, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listen_addr.parse()?;
        let app = self.router();

        info!(addr = %addr, "starting web server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("web server stopped");
        Ok(())
    }
}

/// Assemble routes and middleware over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(api::persons::routes())
        .merge(api::status::routes())
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
