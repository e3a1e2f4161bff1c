//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`QuoteSource`]: top-of-book quote for a market code
//! - [`PersistenceAdapter`]: storage of currency rate records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::rate::{CurrencyRate, ParsedPrice, RateId, RateRecord};

// =============================================================================
// Quote Source
// =============================================================================

/// Top-of-book observation returned by a [`QuoteSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Best ask as parsed from the source.
    pub ask: ParsedPrice,
    /// Best bid as parsed from the source.
    pub bid: ParsedPrice,
    /// Time reported by the source.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Best ask, `0.0` if the source sent an unparseable value.
    #[must_use]
    pub const fn ask_price(&self) -> f64 {
        self.ask.value()
    }

    /// Best bid, `0.0` if the source sent an unparseable value.
    #[must_use]
    pub const fn bid_price(&self) -> f64 {
        self.bid.value()
    }
}

/// Errors from a quote source. Every variant is terminal for the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// The market code is not in the supported table.
    #[error("unknown market: {0}")]
    UnknownMarket(String),

    /// The request did not complete within the client timeout.
    #[error("quote request timed out: {0}")]
    Timeout(String),

    /// Connection or protocol failure.
    #[error("quote request failed: {0}")]
    Transport(String),

    /// The source answered with a non-200 status.
    #[error("unexpected response status: {0}")]
    UnexpectedStatus(String),

    /// The body could not be decoded.
    #[error("failed to decode quote response: {0}")]
    Decode(String),

    /// The order book had no asks or no bids.
    #[error("order book has no {side}")]
    EmptyOrderBook {
        /// Which side was empty ("asks" or "bids").
        side: &'static str,
    },
}

impl QuoteError {
    /// Short label used for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownMarket(_) => "unknown_market",
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::UnexpectedStatus(_) => "unexpected_status",
            Self::Decode(_) => "decode",
            Self::EmptyOrderBook { .. } => "empty_order_book",
        }
    }
}

/// Source of USDT top-of-book quotes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the current quote for a market code such as `"RUB"`.
    ///
    /// Unsupported codes fail with [`QuoteError::UnknownMarket`] without any
    /// network traffic.
    async fn fetch_quote(&self, market_code: &str) -> Result<Quote, QuoteError>;
}

// =============================================================================
// Persistence
// =============================================================================

/// Errors from persistence adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Database connection error.
    #[error("database connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("query error: {0}")]
    Query(String),

    /// A stored row could not be mapped back to a record.
    #[error("missing field: {0}")]
    MissingField(String),

    /// Update targeted an identifier that does not exist.
    #[error("no rate record with id {0}")]
    MissingRecord(RateId),

    /// The adapter has been closed.
    #[error("storage is closed")]
    Closed,
}

/// Storage contract for currency rate records.
///
/// "Not found" on a lookup is `Ok(None)`, never an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Insert a new record and return its identifier.
    async fn create(&self, rate: &CurrencyRate) -> Result<RateId, PersistenceError>;

    /// Fetch a record by identifier.
    async fn get_by_id(&self, id: RateId) -> Result<Option<RateRecord>, PersistenceError>;

    /// Fetch the most recent record for a pair.
    async fn get_by_pair(&self, pair: &str) -> Result<Option<RateRecord>, PersistenceError>;

    /// List every stored record.
    async fn list(&self) -> Result<Vec<RateRecord>, PersistenceError>;

    /// Overwrite an existing record.
    async fn update(&self, record: &RateRecord) -> Result<(), PersistenceError>;

    /// Delete a record. Deleting a missing identifier is not an error.
    async fn delete(&self, id: RateId) -> Result<(), PersistenceError>;

    /// Release the underlying connection. Safe to call more than once.
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quote_collapses_invalid_prices_to_zero() {
        let quote = Quote {
            ask: ParsedPrice::Invalid("n/a".to_string()),
            bid: ParsedPrice::Valid(99.5),
            timestamp: Utc.timestamp_opt(1_698_405_000, 0).unwrap(),
        };
        assert_eq!(quote.ask_price(), 0.0);
        assert_eq!(quote.bid_price(), 99.5);
    }

    #[test]
    fn quote_error_kinds_are_distinct() {
        let errors = [
            QuoteError::UnknownMarket("XXX".to_string()),
            QuoteError::Timeout("10s".to_string()),
            QuoteError::Transport("refused".to_string()),
            QuoteError::UnexpectedStatus("500".to_string()),
            QuoteError::Decode("eof".to_string()),
            QuoteError::EmptyOrderBook { side: "asks" },
        ];
        let mut kinds: Vec<_> = errors.iter().map(QuoteError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn empty_order_book_names_side() {
        let err = QuoteError::EmptyOrderBook { side: "bids" };
        assert_eq!(err.to_string(), "order book has no bids");
    }
}
