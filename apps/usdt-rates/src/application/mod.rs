//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the rate store and the orchestration service, plus
//! the port interfaces they depend on.

/// Port interfaces for external systems (quote source, persistence).
pub mod ports;

/// Application services: the rate store wrapper and the orchestrator.
pub mod services;
