#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! USDT Rates - Quote Snapshot Service
//!
//! A gRPC service that returns the current USDT/<currency> top-of-book quote.
//! Every successful call fetches the order book from the Garantex depth API,
//! stores a snapshot in `PostgreSQL` and returns it.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: `rate` (currency pair, prices, stored records)
//! - **Application**: `ports` (quote source and persistence seams) and
//!   `services` (storage facade and the `GetRates` orchestration)
//! - **Infrastructure**: Garantex client, `PostgreSQL` and in-memory
//!   adapters, gRPC gateway, config, telemetry, metrics, health, lifecycle
//!
//! # Data Flow
//!
//! ```text
//! client ──GetRates──► RpcGateway ──► RateOrchestrator ──► GarantexClient ──► depth API
//!                                            │
//!                                            └──► RateStore ──► PostgreSQL
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Rate types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::rate::{BASE_ASSET, CurrencyRate, ParsedPrice, RateId, RateRecord, pair_for};

// Ports and services
pub use application::ports::{PersistenceAdapter, PersistenceError, Quote, QuoteError, QuoteSource};
pub use application::services::{RateOrchestrator, RateServiceError, RateStore, StoreError};

// Infrastructure config
pub use infrastructure::config::{
    CliArgs, ConfigError, DatabaseSettings, ServerSettings, ServiceConfig,
};

// Adapters
pub use infrastructure::garantex::{GarantexClient, GarantexConfig};
pub use infrastructure::persistence::{CallCounts, InMemoryRateAdapter, PostgresRateAdapter};

// gRPC server (for integration tests)
pub use infrastructure::grpc::{RpcGateway, proto::usdt::v1 as proto};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Lifecycle
pub use infrastructure::lifecycle::{LifecycleError, ServiceLifecycle};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{
    TelemetryConfig, TelemetryGuard, init_with_config as init_telemetry,
};
