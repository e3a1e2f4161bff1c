//! Domain Layer - Core rate types and invariants.
//!
//! This layer contains the currency rate entity and the price parsing rules.
//! Nothing here performs I/O.

/// Currency rate entity, stored records and price parsing.
pub mod rate;
