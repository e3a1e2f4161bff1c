//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the ports defined in the application layer,
//! plus the process plumbing around them.

/// Configuration from environment and command-line flags.
pub mod config;

/// Garantex depth API quote source.
pub mod garantex;

/// gRPC server implementation.
pub mod grpc;

/// Health check and metrics HTTP endpoint.
pub mod health;

/// Startup binding and ordered shutdown.
pub mod lifecycle;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// `PostgreSQL` and in-memory persistence adapters.
pub mod persistence;

/// Tracing subscriber and OpenTelemetry integration.
pub mod telemetry;
