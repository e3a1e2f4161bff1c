//! Service Lifecycle
//!
//! Owns the listening socket, the gRPC server and the storage handle.
//!
//! Shutdown runs once, in order:
//!
//! 1. stop the gRPC server (no new calls, in-flight calls drain)
//! 2. close storage
//! 3. log completion
//!
//! It is triggered by SIGINT/SIGTERM or by cancelling
//! [`ServiceLifecycle::shutdown_token`].

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

use crate::application::ports::PersistenceAdapter;
use crate::infrastructure::config::ServiceConfig;
use crate::infrastructure::grpc::RpcGateway;
use crate::infrastructure::grpc::proto::usdt::v1::rates_service_server::RatesServiceServer;

/// Lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The gRPC port could not be bound.
    #[error("failed to bind gRPC port {port}: {source}")]
    Bind {
        /// Requested port.
        port: u16,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bound socket could not report its address.
    #[error("failed to read listener address: {0}")]
    LocalAddr(#[source] std::io::Error),

    /// The gRPC server stopped with an error.
    #[error("gRPC server failed: {0}")]
    Serve(#[source] tonic::transport::Error),
}

/// Bound, not yet serving, rate service.
pub struct ServiceLifecycle {
    listener: TcpListener,
    gateway: RpcGateway,
    storage: Arc<dyn PersistenceAdapter>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for ServiceLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLifecycle")
            .field("listener", &self.listener)
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl ServiceLifecycle {
    /// Bind the gRPC port on all interfaces.
    ///
    /// Port 0 picks a free port; see [`Self::local_addr`].
    pub async fn bind(
        config: &ServiceConfig,
        gateway: RpcGateway,
        storage: Arc<dyn PersistenceAdapter>,
    ) -> Result<Self, LifecycleError> {
        let port = config.server.grpc_port;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| LifecycleError::Bind { port, source })?;

        Ok(Self {
            listener,
            gateway,
            storage,
            shutdown: CancellationToken::new(),
        })
    }

    /// Address the gRPC listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, LifecycleError> {
        self.listener.local_addr().map_err(LifecycleError::LocalAddr)
    }

    /// Token that starts the shutdown protocol when cancelled.
    ///
    /// Cancelling more than once has no further effect.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve until a termination signal or token cancellation, then shut down.
    ///
    /// Storage is closed even when the server fails.
    pub async fn run(self) -> Result<(), LifecycleError> {
        let Self {
            listener,
            gateway,
            storage,
            shutdown,
        } = self;

        let signal_task = tokio::spawn(await_shutdown_signal(shutdown.clone()));

        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "gRPC server listening");
        }

        let served = Server::builder()
            .add_service(RatesServiceServer::new(gateway))
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(listener),
                shutdown.clone().cancelled_owned(),
            )
            .await;

        shutdown.cancel();
        signal_task.abort();
        tracing::info!("gRPC server stopped");

        storage.close().await;
        tracing::info!("Storage closed");

        tracing::info!("Service stopped");
        served.map_err(LifecycleError::Serve)
    }
}

/// Wait for SIGINT/SIGTERM and cancel `shutdown`. Returns early if the token
/// is cancelled elsewhere.
async fn await_shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = shutdown.cancelled() => return,
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown.cancel();
}
