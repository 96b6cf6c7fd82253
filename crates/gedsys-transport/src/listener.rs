//! Notification listener: HTTP sink for publisher callbacks.
//!
//! Publishers target this endpoint with the engine's event envelope; one
//! dispatcher serves every deployment with a bounded number of in-flight
//! requests and a single race-free notification counter (no per-event
//! server processes).

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tracing::{info, warn};

use gedsys_core::store::TransportError;

/// Shared listener state.
#[derive(Default)]
pub struct ListenerState {
    received: AtomicU64,
}

impl ListenerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications accepted so far.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

/// Extract the originating event id from a publisher notification envelope.
pub fn notification_event_id(payload: &Value) -> Option<&str> {
    payload
        .get("event")?
        .get("correlationData")?
        .get("event_id")?
        .as_str()
}

async fn receive_notification(
    Extension(state): Extension<Arc<ListenerState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let Some(event_id) = notification_event_id(&payload) else {
        warn!("notification without a correlation event id, rejecting");
        return Err(StatusCode::BAD_REQUEST);
    };
    let received = state.received.fetch_add(1, Ordering::Relaxed) + 1;
    info!(event = "notification.received", event_id = %event_id, received = received);
    Ok(Json(json!({ "received": received })))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") }))
}

/// Build the listener router with at most `workers` in-flight requests.
pub fn notification_router(state: Arc<ListenerState>, workers: usize) -> Router {
    Router::new()
        .route("/", post(receive_notification))
        .route("/health", get(health))
        .layer(ConcurrencyLimitLayer::new(workers.max(1)))
        .layer(Extension(state))
}

/// Serve publisher notifications on `addr` until interrupted (Ctrl-C).
pub async fn serve_notifications(
    addr: SocketAddr,
    state: Arc<ListenerState>,
    workers: usize,
) -> Result<(), TransportError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TransportError::Http(format!("bind {addr}: {e}")))?;
    info!(addr = %addr, workers, "notification listener up");
    axum::serve(listener, notification_router(state, workers))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .map_err(|e| TransportError::Http(e.to_string()))
}
