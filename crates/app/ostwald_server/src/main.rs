//! Ostwald chat server binary.
//!
//! Serves the chat page from the public directory and the `/get` endpoint
//! that forwards messages to Gemini.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ostwald_api::config::ApiConfig;
use ostwald_core::gateway::{GeminiClient, GeminiConfig, gemini};
use ostwald_core::store::{ChatStore, MemoryChatStore, PgChatStore};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// CLI arguments for the chat server.
#[derive(Parser, Debug)]
#[command(name = "ostwald_server", about = "Ostwald chat server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Gemini API key. Required.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model name.
    #[arg(long, env = "GEMINI_MODEL", default_value = gemini::DEFAULT_MODEL)]
    gemini_model: String,

    /// Gemini API base URL.
    #[arg(long, env = "GEMINI_BASE_URL", default_value = gemini::DEFAULT_BASE_URL)]
    gemini_base_url: String,

    /// Timeout for one Gemini call, in seconds.
    #[arg(long, env = "GEMINI_TIMEOUT_SECS", default_value_t = gemini::DEFAULT_TIMEOUT_SECS)]
    gemini_timeout_secs: u64,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/ostwald"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep messages and context in memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    memory_store: bool,

    /// Context row shared by every session.
    #[arg(long, env = "CHAT_USER_ID", default_value = ostwald_core::SHARED_USER_ID)]
    user_id: String,

    /// Send the logged conversation with each prompt.
    #[arg(long, env = "INCLUDE_HISTORY", default_value_t = false)]
    include_history: bool,

    /// Directory served at `/`.
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,

    /// Directory for in-flight uploads.
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Request body limit in bytes.
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = ostwald_api::config::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ostwald_api=debug,ostwald_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let Some(api_key) = args.gemini_api_key.clone().filter(|k| !k.trim().is_empty()) else {
        error!("GEMINI_API_KEY is not set");
        std::process::exit(1);
    };

    info!(port = args.port, model = %args.gemini_model, "starting ostwald_server");

    let store = connect_store(&args).await;

    let model = GeminiClient::new(&GeminiConfig {
        api_key,
        model: args.gemini_model.clone(),
        base_url: args.gemini_base_url.clone(),
        timeout: Duration::from_secs(args.gemini_timeout_secs),
    })?;

    let config = ApiConfig {
        bind_addr: format!("0.0.0.0:{}", args.port),
        user_id: args.user_id.clone(),
        include_history: args.include_history,
        public_dir: args.public_dir.clone(),
        upload_dir: args.upload_dir.clone(),
        max_upload_bytes: args.max_upload_bytes,
        ..ApiConfig::default()
    };

    if config.user_id == ostwald_core::SHARED_USER_ID {
        warn!(user_id = %config.user_id, "all sessions share one context row");
    }

    let shutdown = CancellationToken::new();
    let state = ostwald_api::AppState {
        store,
        model: Arc::new(model),
        config: config.clone(),
        shutdown: shutdown.clone(),
    };

    let app = ostwald_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// Build the store. Database problems are logged and never stop startup:
/// the pool connects lazily, so requests that touch the store fail until
/// the database is reachable.
async fn connect_store(args: &Args) -> Arc<dyn ChatStore> {
    if args.memory_store {
        info!("using in-memory store");
        return Arc::new(MemoryChatStore::new());
    }

    let pool = match PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(&args.database_url)
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("invalid DATABASE_URL, falling back to in-memory store: {e}");
            return Arc::new(MemoryChatStore::new());
        }
    };

    info!("running database migrations");
    match ostwald_core::migrate::migrate(&pool).await {
        Ok(()) => info!("connected to database"),
        Err(e) => error!("database connection error: {e}"),
    }

    Arc::new(PgChatStore::new(pool))
}
