//! Currency Rate Types
//!
//! Domain types for USDT quote snapshots.
//!
//! # Design
//!
//! - [`CurrencyRate`] is immutable once built. The pair is always derived
//!   from a market code, never taken from the caller verbatim.
//! - [`RateRecord`] pairs a rate with the identifier the persistence layer
//!   assigned on insert. Only point lookups, updates and deletes use it.
//! - [`ParsedPrice`] keeps a malformed upstream price distinguishable from a
//!   genuine zero, while [`ParsedPrice::value`] still offers the collapsed
//!   `0.0` view.

use std::fmt;

use chrono::{DateTime, Utc};

/// Base asset of every pair served by this service.
pub const BASE_ASSET: &str = "USDT";

// =============================================================================
// Currency Rate
// =============================================================================

/// A single ask/bid observation for one USDT pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurrencyRate {
    pair: String,
    ask_price: f64,
    bid_price: f64,
    timestamp: DateTime<Utc>,
}

impl CurrencyRate {
    /// Build a rate for a market code such as `"RUB"`.
    ///
    /// The pair becomes `"USDT/" + market_code`.
    #[must_use]
    pub fn for_market(
        market_code: &str,
        ask_price: f64,
        bid_price: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::from_parts(pair_for(market_code), ask_price, bid_price, timestamp)
    }

    /// Rebuild a rate from stored parts (used by persistence adapters).
    #[must_use]
    pub const fn from_parts(
        pair: String,
        ask_price: f64,
        bid_price: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            pair,
            ask_price,
            bid_price,
            timestamp,
        }
    }

    /// Currency pair, e.g. `"USDT/RUB"`.
    #[must_use]
    pub fn pair(&self) -> &str {
        &self.pair
    }

    /// Best ask price.
    #[must_use]
    pub const fn ask_price(&self) -> f64 {
        self.ask_price
    }

    /// Best bid price.
    #[must_use]
    pub const fn bid_price(&self) -> f64 {
        self.bid_price
    }

    /// Time reported by the quote source.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether this is the zero value (no pair set).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pair.is_empty()
    }
}

/// Build the pair string for a market code.
#[must_use]
pub fn pair_for(market_code: &str) -> String {
    format!("{BASE_ASSET}/{market_code}")
}

// =============================================================================
// Stored Records
// =============================================================================

/// Identifier assigned by the persistence layer on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RateId(i64);

impl RateId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted rate together with its identifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RateRecord {
    /// Identifier assigned on insert.
    pub id: RateId,
    /// Stored rate.
    pub rate: CurrencyRate,
}

impl RateRecord {
    /// Create a record.
    #[must_use]
    pub const fn new(id: RateId, rate: CurrencyRate) -> Self {
        Self { id, rate }
    }

    /// Whether this is the zero-value record returned for "not found".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.get() == 0 && self.rate.is_empty()
    }
}

// =============================================================================
// Price Parsing
// =============================================================================

/// Outcome of parsing a price string from the quote source.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPrice {
    /// A finite, non-negative price.
    Valid(f64),
    /// The raw text that could not be used as a price.
    Invalid(String),
}

impl ParsedPrice {
    /// Parse a decimal price string.
    ///
    /// The whole string must be a number: surrounding whitespace makes it
    /// invalid. Negative and non-finite numbers are rejected so that every
    /// valid price is `>= 0`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Self::Valid(value),
            _ => Self::Invalid(raw.to_string()),
        }
    }

    /// Price value, or exactly `0.0` when the input was unparseable.
    #[must_use]
    pub const fn value(&self) -> f64 {
        match self {
            Self::Valid(value) => *value,
            Self::Invalid(_) => 0.0,
        }
    }

    /// Whether the price parsed successfully.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

// =============================================================================
// Tests
// =============================================================================
