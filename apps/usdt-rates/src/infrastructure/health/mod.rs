//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for liveness probes and Prometheus scraping.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON status with version and uptime
//! - `GET /healthz` - Liveness probe (plain `OK`)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::metrics::get_metrics_handle;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: &'static str,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
}

/// Shared state for the health server.
#[derive(Debug)]
pub struct HealthServerState {
    version: String,
    started_at: Instant,
}

impl HealthServerState {
    /// Create new health server state.
    #[must_use]
    pub fn new(version: String) -> Self {
        Self {
            version,
            started_at: Instant::now(),
        }
    }
}

/// Health check HTTP server bound to its port.
pub struct HealthServer {
    listener: TcpListener,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Bind the listener on all interfaces.
    pub async fn bind(
        port: u16,
        state: Arc<HealthServerState>,
        cancel: CancellationToken,
    ) -> Result<Self, HealthServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(port, e.to_string()))?;

        Ok(Self {
            listener,
            state,
            cancel,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, HealthServerError> {
        self.listener
            .local_addr()
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))
    }

    /// Bind and serve on a background task until cancelled.
    ///
    /// A bind failure is logged and yields `None`; the caller keeps running
    /// without the endpoint.
    pub async fn spawn(
        port: u16,
        state: Arc<HealthServerState>,
        cancel: CancellationToken,
    ) -> Option<SocketAddr> {
        let server = match Self::bind(port, state, cancel).await {
            Ok(server) => server,
            Err(e) => {
                tracing::error!(error = %e, "Health server disabled");
                return None;
            }
        };
        let addr = match server.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                tracing::error!(error = %e, "Health server disabled");
                return None;
            }
        };

        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                tracing::error!(error = %e, "Health server error");
            }
        });
        Some(addr)
    }

    /// Serve until cancelled.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/healthz", get(liveness_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state);

        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "Health server listening");
        }

        axum::serve(self.listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
    })
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}
