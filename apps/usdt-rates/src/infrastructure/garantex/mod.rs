//! Garantex Quote Source
//!
//! Fetches the USDT order book from the Garantex depth endpoint and reduces
//! it to a top-of-book [`Quote`](crate::application::ports::Quote).
//!
//! One GET per call, no retries. Unsupported market codes are rejected
//! before any request is made.

mod client;
mod messages;

pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, GarantexClient, GarantexConfig, market_symbol};
pub use messages::{DepthLevel, DepthResponse};
