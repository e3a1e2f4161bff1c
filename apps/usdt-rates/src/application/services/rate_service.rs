//! Rate Orchestrator
//!
//! Fetches a quote, turns it into a [`CurrencyRate`], persists it once and
//! hands it back. A failed fetch never reaches storage; a failed insert
//! discards the quote.

use std::sync::Arc;

use thiserror::Error;

use super::rate_store::{RateStore, StoreError};
use crate::application::ports::{QuoteError, QuoteSource};
use crate::domain::rate::CurrencyRate;

/// Errors from [`RateOrchestrator::get_rates`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateServiceError {
    /// The quote source failed.
    #[error("failed to fetch quote: {0}")]
    Quote(#[from] QuoteError),

    /// The snapshot could not be stored.
    #[error("failed to persist rate: {0}")]
    Store(#[from] StoreError),
}

/// Coordinates the quote source and the rate store.
#[derive(Clone)]
pub struct RateOrchestrator {
    quotes: Arc<dyn QuoteSource>,
    store: RateStore,
}

impl std::fmt::Debug for RateOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateOrchestrator")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl RateOrchestrator {
    /// Create an orchestrator.
    #[must_use]
    pub fn new(quotes: Arc<dyn QuoteSource>, store: RateStore) -> Self {
        Self { quotes, store }
    }

    /// Fetch, persist and return the current rate for a market code.
    #[tracing::instrument(skip(self))]
    pub async fn get_rates(&self, market_code: &str) -> Result<CurrencyRate, RateServiceError> {
        let quote = self.quotes.fetch_quote(market_code).await?;

        let rate = CurrencyRate::for_market(
            market_code,
            quote.ask_price(),
            quote.bid_price(),
            quote.timestamp,
        );

        let id = self.store.create(&rate).await?;

        tracing::debug!(
            %id,
            pair = rate.pair(),
            ask = rate.ask_price(),
            bid = rate.bid_price(),
            "Rate snapshot stored"
        );

        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::application::ports::{
        MockPersistenceAdapter, MockQuoteSource, PersistenceError, Quote,
    };
    use crate::domain::rate::{ParsedPrice, RateId};

    fn quote_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_698_405_000, 0).unwrap()
    }

    fn quote(ask: &str, bid: &str) -> Quote {
        Quote {
            ask: ParsedPrice::parse(ask),
            bid: ParsedPrice::parse(bid),
            timestamp: quote_time(),
        }
    }

    fn orchestrator(quotes: MockQuoteSource, adapter: MockPersistenceAdapter) -> RateOrchestrator {
        RateOrchestrator::new(Arc::new(quotes), RateStore::new(Arc::new(adapter)))
    }

    #[tokio::test]
    async fn success_builds_pair_and_persists_once() {
        let mut quotes = MockQuoteSource::new();
        quotes
            .expect_fetch_quote()
            .withf(|code| code == "RUB")
            .times(1)
            .returning(|_| Ok(quote("100.5", "99.5")));

        let mut adapter = MockPersistenceAdapter::new();
        adapter
            .expect_create()
            .withf(|rate| {
                rate.pair() == "USDT/RUB"
                    && rate.ask_price() == 100.5
                    && rate.bid_price() == 99.5
                    && rate.timestamp() == quote_time()
            })
            .times(1)
            .returning(|_| Ok(RateId::new(1)));

        let rate = orchestrator(quotes, adapter).get_rates("RUB").await.unwrap();

        assert_eq!(rate.pair(), "USDT/RUB");
        assert_eq!(rate.ask_price(), 100.5);
        assert_eq!(rate.bid_price(), 99.5);
        assert_eq!(rate.timestamp(), quote_time());
    }

    #[tokio::test]
    async fn fetch_failure_skips_persistence() {
        let mut quotes = MockQuoteSource::new();
        quotes
            .expect_fetch_quote()
            .returning(|code| Err(QuoteError::UnknownMarket(code.to_string())));

        let mut adapter = MockPersistenceAdapter::new();
        adapter.expect_create().never();

        let err = orchestrator(quotes, adapter)
            .get_rates("INVALID")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RateServiceError::Quote(QuoteError::UnknownMarket("INVALID".to_string()))
        );
    }

    #[tokio::test]
    async fn persistence_failure_returns_error() {
        let mut quotes = MockQuoteSource::new();
        quotes
            .expect_fetch_quote()
            .returning(|_| Ok(quote("1.08", "1.07")));

        let mut adapter = MockPersistenceAdapter::new();
        adapter
            .expect_create()
            .times(1)
            .returning(|_| Err(PersistenceError::Connection("refused".to_string())));

        let err = orchestrator(quotes, adapter)
            .get_rates("EUR")
            .await
            .unwrap_err();

        assert!(matches!(err, RateServiceError::Store(StoreError::Create(_))));
        assert_eq!(
            err.to_string(),
            "failed to persist rate: failed to create rate record: \
             database connection error: refused"
        );
    }

    #[tokio::test]
    async fn malformed_prices_are_stored_as_zero() {
        let mut quotes = MockQuoteSource::new();
        quotes
            .expect_fetch_quote()
            .returning(|_| Ok(quote("abc", "")));

        let mut adapter = MockPersistenceAdapter::new();
        adapter
            .expect_create()
            .withf(|rate| rate.ask_price() == 0.0 && rate.bid_price() == 0.0)
            .times(1)
            .returning(|_| Ok(RateId::new(1)));

        let rate = orchestrator(quotes, adapter).get_rates("KGS").await.unwrap();

        assert_eq!(rate.pair(), "USDT/KGS");
        assert_eq!(rate.ask_price(), 0.0);
    }

    #[tokio::test]
    async fn every_call_persists_its_own_row() {
        let mut quotes = MockQuoteSource::new();
        quotes
            .expect_fetch_quote()
            .times(2)
            .returning(|_| Ok(quote("90", "89")));

        let mut adapter = MockPersistenceAdapter::new();
        adapter
            .expect_create()
            .times(2)
            .returning(|_| Ok(RateId::new(1)));

        let service = orchestrator(quotes, adapter);
        service.get_rates("USD").await.unwrap();
        service.get_rates("USD").await.unwrap();
    }
}
