//! # ostwald_api
//!
//! HTTP API library for Ostwald.

pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use ostwald_core::chat::TurnSettings;
use ostwald_core::gateway::GenerativeModel;
use ostwald_core::store::ChatStore;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{chat, health, history, stream};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Message log and context store.
    pub store: Arc<dyn ChatStore>,
    /// Generative model behind the gateway.
    pub model: Arc<dyn GenerativeModel>,
    /// API configuration.
    pub config: ApiConfig,
    /// Cancelled on shutdown; stops in-flight reveal streams.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn turn_settings(&self) -> TurnSettings {
        TurnSettings {
            user_id: self.config.user_id.clone(),
            include_history: self.config.include_history,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
///
/// Anything not matched by an API route is served from `public_dir`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route("/get", post(chat::chat_handler))
        .route("/stream", post(stream::stream_handler))
        .route("/history", get(history::history_handler))
        .route("/transcript", get(history::transcript_handler))
        .route("/api/health", get(health::health_handler))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
