//! Liveness endpoint.
//!
//! Hosting platforms health-check the agent over HTTP, so a tiny server
//! answers `GET /` and `GET /health` with a one-line status. It runs on its
//! own task and shares nothing with the polling loop.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use follower_core::{AgentError, Result, ServerConfig};

/// Static facts reported by the liveness endpoint.
#[derive(Debug, Clone)]
pub struct ServerStatus {
    /// True when trading against the demo environment.
    pub testnet: bool,
}

impl ServerStatus {
    fn body(&self) -> String {
        let mode = if self.testnet { "testnet" } else { "live" };
        format!("follower agent running | mode: {mode} | polling: active")
    }
}

async fn status(State(state): State<ServerStatus>) -> String {
    state.body()
}

/// Builds the liveness router.
#[must_use]
pub fn router(status_state: ServerStatus) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(status_state)
}

/// Binds and serves the liveness endpoint until the process exits.
///
/// # Errors
/// Returns an error if the listen address cannot be bound.
pub async fn serve(config: &ServerConfig, status_state: ServerStatus) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AgentError::Configuration(format!("cannot bind {addr}: {e}")))?;

    info!("liveness endpoint listening on {addr}");

    axum::serve(listener, router(status_state))
        .await
        .map_err(|e| AgentError::Network(e.to_string()))
}
