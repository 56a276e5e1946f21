//! HTTP surface
//!
//! JSON views of today's tasks plus form-post endpoints that redirect back
//! to `/tasks/`. Generated images are served from `/media/`.

mod error;
mod handlers;
mod owner;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use chrono::NaiveDate;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use error::ApiError;
pub use owner::{OWNER_HEADER, Owner};

use crate::media::MediaStore;
use crate::planning::TaskDecomposer;
use crate::state::StateManager;
use crate::worker::PalaceQueue;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub state: StateManager,
    pub decomposer: Arc<TaskDecomposer>,
    pub queue: PalaceQueue,
    /// Image files, served under `/media/`
    pub media: MediaStore,
}

impl AppState {
    /// Calendar date sessions are keyed on
    pub fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    let media = ServeDir::new(state.media.root());

    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/tasks/", get(handlers::list_tasks))
        .route("/add/", post(handlers::add_task))
        .route("/toggle_complete/{id}/", post(handlers::toggle_complete))
        .route("/tasks/{id}/delete/", post(handlers::delete_task))
        .route("/subtask/{id}/edit/", post(handlers::edit_sub_task))
        .route("/health", get(handlers::health_check))
        .nest_service("/media", media)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down gracefully"),
        () = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
