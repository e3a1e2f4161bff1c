//! Persistence adapters.
//!
//! - `PostgresRateAdapter`: production storage over `sqlx`
//! - `InMemoryRateAdapter`: test double with call counts and failure injection

mod in_memory;
mod postgres;

pub use in_memory::{CallCounts, InMemoryRateAdapter};
pub use postgres::PostgresRateAdapter;
