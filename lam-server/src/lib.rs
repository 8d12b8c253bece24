//! REST API for the LAM clear-run leaderboard.
//!
//! Submissions land as `pending`; only approved records are listed publicly.
//! Moderation endpoints have no authentication and are expected to sit behind
//! a private network or reverse proxy.
//!
//! | Method | Path | |
//! |---|---|---|
//! | `POST` | `/api/rankings/submit` | new submission |
//! | `GET` | `/api/rankings/list` | approved records, filtered and paged |
//! | `GET` | `/api/rankings/pending` | moderation queue |
//! | `GET` | `/api/rankings/{id}` | one record |
//! | `DELETE` | `/api/rankings/{id}` | remove a record |
//! | `POST` | `/api/rankings/approve/{id}` | `{"action": "approve" \| "reject"}` |
//! | `GET` | `/api/health` | liveness |
use std::path::Path;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use log::{info, warn};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, services::ServeDir};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::Config;
use routes::{
    SharedState, delete_handler, get_handler, health_handler, list_handler, moderate_handler,
    pending_handler, submit_handler,
};
use state::AppState;

/// The API router, optionally serving a front-end directory for every other path.
pub fn router(state: SharedState, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/rankings/submit", post(submit_handler))
        .route("/api/rankings/list", get(list_handler))
        .route("/api/rankings/pending", get(pending_handler))
        .route("/api/rankings/approve/{id}", post(moderate_handler))
        .route("/api/rankings/{id}", get(get_handler).delete(delete_handler))
        .route("/api/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    match static_dir {
        Some(dir) => {
            info!("Serving static files from {}", dir.display());
            api.fallback_service(ServeDir::new(dir))
        }
        None => api,
    }
}

/// Open the store, bind and serve until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the address is invalid,
/// or the listener fails.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    info!("Initializing state...");
    let state = AppState::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    let address = config.address().context("invalid host/port")?;
    info!("Binding to {address}");
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on http://{address}");

    axum::serve(listener, router(state, config.static_dir.as_deref()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
