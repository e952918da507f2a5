//! HTTP + WebSocket front end of a ledger network.
//!
//! Exposes a [`Transport`] and an [`EventSource`] to remote clients:
//!
//! - `POST /api/v1/transactions` submit a transaction
//! - `POST /api/v1/queries` evaluate a read-only query
//! - `GET  /api/v1/transactions/{tx_id}` commit status
//! - `GET  /ws/events` stream of committed events

mod error;
mod http;
mod ws;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use ledger_api::{EventSource, Transport};

pub use error::GatewayError;

#[derive(Clone)]
pub struct AppState {
    transport: Arc<dyn Transport>,
    events: Arc<dyn EventSource>,
}

impl AppState {
    pub fn new(transport: Arc<dyn Transport>, events: Arc<dyn EventSource>) -> Self {
        Self { transport, events }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/transactions", post(http::handle_submit))
        .route("/api/v1/transactions/{tx_id}", get(http::handle_status))
        .route("/api/v1/queries", post(http::handle_query))
        .route("/ws/events", get(ws::handle_events))
        .with_state(state)
}

/// Bind `listen` and serve until `shutdown` is cancelled.
pub async fn run(listen: String, state: AppState, shutdown: CancellationToken) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(&listen)
        .await
        .map_err(|source| GatewayError::Bind { addr: listen.clone(), source })?;
    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, state: AppState, shutdown: CancellationToken) -> Result<(), GatewayError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "gateway listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("gateway stopped");
    Ok(())
}
