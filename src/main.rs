//! Sessionward Server: session lifecycle endpoints over a remote or
//! in-memory session core.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use sessionward_api::handlers::session::session_info;
use sessionward_api::{ApiState, build_router};
use sessionward_auth::store::spawn_purge_task;
use sessionward_auth::{
    CoreClient, MemorySessionStore, RecipeSlot, SessionRecipeBuilder, SessionStore,
};
use sessionward_core::config::{AppConfig, CoreMode};
use sessionward_core::error::AppError;
use sessionward_core::traits::SystemClock;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("SESSIONWARD_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Sessionward v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 2: Session core ─────────────────────────────────────
    let (store, purge_handle) = match config.core.mode {
        CoreMode::Http => {
            tracing::info!(uri = %config.core.connection_uri, "Using remote session core");
            let client: Arc<dyn SessionStore> = Arc::new(CoreClient::new(&config.core)?);
            (client, None)
        }
        CoreMode::Memory => {
            tracing::info!("Using in-memory session core");
            let store = MemorySessionStore::new(config.token.refresh_ttl()?, Arc::new(SystemClock));
            let handle = spawn_purge_task(
                store.clone(),
                Duration::from_secs(config.core.purge_interval_seconds),
                shutdown_rx.clone(),
            );
            let store: Arc<dyn SessionStore> = Arc::new(store);
            (store, Some(handle))
        }
    };

    // ── Step 3: Session recipe ───────────────────────────────────
    let slot = RecipeSlot::new();
    let recipe = slot.init(SessionRecipeBuilder::new(
        config.token.clone(),
        config.session.clone(),
        store,
    ))?;
    for api in recipe.apis_handled() {
        tracing::info!(path = %api.path, id = api.id, disabled = api.disabled, "Session endpoint");
    }

    // ── Step 4: Build and start HTTP server ──────────────────────
    let app_routes = Router::new().route("/sessioninfo", get(session_info));
    let app = build_router(ApiState::new(recipe), app_routes, &config.server.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Sessionward server listening on {}", addr);

    // ── Step 5: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 6: Wait for background tasks ───────────────────────
    if let Some(handle) = purge_handle {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        let _ = tokio::time::timeout(grace, handle).await;
    }

    tracing::info!("Sessionward server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
