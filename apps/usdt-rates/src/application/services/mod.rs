//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `RateStore`: uniform error wrapping over a persistence adapter
//! - `RateOrchestrator`: fetch a quote, persist the snapshot, return it

mod rate_service;
mod rate_store;

pub use rate_service::{RateOrchestrator, RateServiceError};
pub use rate_store::{RateStore, StoreError};
