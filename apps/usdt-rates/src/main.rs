//! USDT Rates Binary
//!
//! Starts the quote snapshot service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin usdt-rates -- --port 50051
//! ```
//!
//! # Environment Variables
//!
//! Flags of the same name override these.
//!
//! - `PORT`: gRPC server port (default: 50051)
//! - `METRICS_PORT`: Health/metrics HTTP port, 0 disables it (default: 9090)
//! - `APP_NAME`: Application name (default: usdt-rates)
//! - `LOG_LEVEL`: Log filter when `RUST_LOG` is unset (default: info)
//! - `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT`, `DB_DATABASE`: `PostgreSQL` connection
//! - `DB_MAX_CONNECTIONS`: Pool size (default: 5)
//! - `GARANTEX_BASE_URL`: Depth endpoint (default: <https://garantex.org/api/v2/depth>)
//! - `GARANTEX_TIMEOUT_SECS`: Upstream request timeout (default: 10)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)

use std::sync::Arc;

use clap::Parser;
use usdt_rates::infrastructure::health::{HealthServer, HealthServerState};
use usdt_rates::infrastructure::telemetry::{self, TelemetryConfig};
use usdt_rates::{
    CliArgs, GarantexClient, PostgresRateAdapter, RateOrchestrator, RateStore, RpcGateway,
    ServiceConfig, ServiceLifecycle, init_metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let args = CliArgs::parse();

    let mut config = ServiceConfig::from_env()?;
    config.apply_overrides(&args);

    let _telemetry_guard =
        telemetry::init_with_config(TelemetryConfig::from_env(&config.app_name, &config.log_level));

    tracing::info!(app = %config.app_name, "Starting USDT rates service");
    log_config(&config);

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Prometheus recorder not installed, metrics disabled");
    }

    let storage = Arc::new(PostgresRateAdapter::connect_lazy(&config.database));
    if let Err(e) = storage.run_migrations().await {
        tracing::error!(
            error = %e,
            "Database migrations failed, requests will fail until storage is reachable"
        );
    }

    let quotes = Arc::new(GarantexClient::new(&config.garantex)?);
    let orchestrator = RateOrchestrator::new(quotes, RateStore::new(storage.clone()));

    let lifecycle = ServiceLifecycle::bind(&config, RpcGateway::new(orchestrator), storage).await?;
    let shutdown_token = lifecycle.shutdown_token();

    if config.server.metrics_port != 0 {
        let health_state = Arc::new(HealthServerState::new(
            env!("CARGO_PKG_VERSION").to_string(),
        ));
        HealthServer::spawn(
            config.server.metrics_port,
            health_state,
            shutdown_token.child_token(),
        )
        .await;
    }

    tracing::info!("USDT rates service ready");
    lifecycle.run().await?;

    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &ServiceConfig) {
    tracing::info!(
        grpc_port = config.server.grpc_port,
        metrics_port = config.server.metrics_port,
        db_host = %config.database.host,
        db_port = config.database.port,
        db_name = %config.database.database,
        "Configuration loaded"
    );
    tracing::debug!(
        base_url = %config.garantex.base_url,
        timeout_secs = config.garantex.timeout.as_secs(),
        "Quote source"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
