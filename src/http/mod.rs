//! Axum HTTP front of the relay.
//!
//! ## URL layout
//!
//! ```text
//! GET     {path}   → 200, empty body (liveness)
//! POST    {path}   → { "reply": ... } | { "error": ... }
//! OPTIONS {path}   → CORS preflight, empty body
//! ```
//!
//! `{path}` is `[relay].path` (default `/`). CORS is open to every origin.
//! `run()` drives the axum event loop; the [`CancellationToken`] is wired to
//! axum's graceful shutdown.

mod api;
pub mod wire;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::AppError;
use crate::relay::Relay;

// ── Shared request state ──────────────────────────────────────────────────────

/// Axum router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone — all fields are reference-counted or `Copy`.
#[derive(Clone)]
pub struct HttpState {
    pub relay: Arc<Relay>,
    /// Upper bound on one `POST`, search and inference included.
    pub request_timeout: Duration,
}

impl HttpState {
    pub fn new(relay: Arc<Relay>, request_timeout: Duration) -> Self {
        Self { relay, request_timeout }
    }
}

// ── Server loop ───────────────────────────────────────────────────────────────

pub async fn run(
    bind_addr: String,
    path: String,
    state: HttpState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let router = build_router(state, &path);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Http(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, %path, "relay listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Http(format!("server error: {e}")))?;

    info!("relay shut down");
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: HttpState, path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(path, get(api::liveness).post(api::answer).options(api::preflight))
        .layer(cors)
        .with_state(state)
}
