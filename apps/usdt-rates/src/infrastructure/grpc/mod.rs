//! gRPC Server
//!
//! Implements the `usdt.v1.RatesService` gRPC service.
//!
//! # Architecture
//!
//! The gateway owns no state of its own. Each `GetRates` call:
//!
//! 1. Hands the requested currency code to the `RateOrchestrator`
//! 2. Maps the stored rate to the wire message
//! 3. Maps failures to a status code, keeping the full error text

pub mod server;

/// Include generated protobuf code.
/// `usdt.v1.rs` includes `usdt.v1.tonic.rs` at the end.
#[allow(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
pub mod proto {
    pub mod usdt {
        pub mod v1 {
            include!("../../../../../packages/schema-gen/rust/usdt/v1/usdt.v1.rs");
        }
    }
}

pub use server::{RpcGateway, status_from_error};
