//! HTTP surface.
//!
//! - `GET /` front-end page
//! - `GET /health`
//! - `GET /get_voices` grouped voice listing
//! - `POST /synthesize` `{text, voice}` → `{success, filename, note?}`
//! - `GET /download/{filename}` attachment with a fresh download name
//! - `GET /audio/{filename}` inline audio stream

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{AppState, SynthesizeBody, SynthesizeResponse};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::engine::Dispatcher;

/// Build the application router.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(routes::index_handler))
        .route("/health", get(routes::health_handler))
        .route("/get_voices", get(routes::voices_handler))
        .route("/synthesize", post(routes::synthesize_handler))
        .route("/download/:filename", get(routes::download_handler))
        .route("/audio/:filename", get(routes::audio_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { dispatcher })
}

/// Serve `router` on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(url = %format!("http://{}", listener.local_addr()?), "server ready");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
