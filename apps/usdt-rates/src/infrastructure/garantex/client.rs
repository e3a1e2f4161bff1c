//! Garantex depth API client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};

use super::messages::{DepthLevel, DepthResponse};
use crate::application::ports::{Quote, QuoteError, QuoteSource};
use crate::domain::rate::ParsedPrice;
use crate::infrastructure::metrics;

/// Default depth endpoint.
pub const DEFAULT_BASE_URL: &str = "https://garantex.org/api/v2/depth";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Supported market codes and their Garantex symbols.
const MARKETS: [(&str, &str); 4] = [
    ("RUB", "usdtrub"),
    ("USD", "usdtusd"),
    ("EUR", "usdteur"),
    ("KGS", "usdtkgs"),
];

/// Garantex symbol for a market code, if supported.
#[must_use]
pub fn market_symbol(market_code: &str) -> Option<&'static str> {
    MARKETS
        .iter()
        .find(|(code, _)| *code == market_code)
        .map(|(_, symbol)| *symbol)
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct GarantexConfig {
    /// Depth endpoint URL.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for GarantexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// [`QuoteSource`] backed by the Garantex depth endpoint.
#[derive(Debug, Clone)]
pub struct GarantexClient {
    client: Client,
    base_url: String,
}

impl GarantexClient {
    /// Build a client. An empty base URL falls back to [`DEFAULT_BASE_URL`].
    pub fn new(config: &GarantexConfig) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| QuoteError::Transport(e.to_string()))?;

        let base_url = if config.base_url.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            config.base_url.clone()
        };

        Ok(Self { client, base_url })
    }

    /// Endpoint this client queries.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_depth(&self, symbol: &str) -> Result<DepthResponse, QuoteError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("market", symbol)])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(QuoteError::UnexpectedStatus(status.to_string()));
        }

        let body = response.text().await.map_err(request_error)?;
        serde_json::from_str(&body).map_err(|e| QuoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl QuoteSource for GarantexClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_quote(&self, market_code: &str) -> Result<Quote, QuoteError> {
        let symbol = market_symbol(market_code)
            .ok_or_else(|| QuoteError::UnknownMarket(market_code.to_string()))?;

        let started = Instant::now();
        let depth = self.fetch_depth(symbol).await;
        metrics::record_quote_fetch(started.elapsed());
        let depth = depth?;

        let ask = depth
            .best_ask()
            .ok_or(QuoteError::EmptyOrderBook { side: "asks" })?;
        let bid = depth
            .best_bid()
            .ok_or(QuoteError::EmptyOrderBook { side: "bids" })?;

        let timestamp = DateTime::from_timestamp(depth.timestamp, 0).ok_or_else(|| {
            QuoteError::Decode(format!("timestamp out of range: {}", depth.timestamp))
        })?;

        Ok(Quote {
            ask: parse_level(symbol, "ask", ask),
            bid: parse_level(symbol, "bid", bid),
            timestamp,
        })
    }
}

fn parse_level(symbol: &str, side: &str, level: &DepthLevel) -> ParsedPrice {
    let price = ParsedPrice::parse(level.price.as_deref().unwrap_or_default());
    if let ParsedPrice::Invalid(raw) = &price {
        tracing::warn!(symbol, side, raw = %raw, "Unparseable price, using 0");
    }
    price
}

fn request_error(err: reqwest::Error) -> QuoteError {
    if err.is_timeout() {
        QuoteError::Timeout(err.to_string())
    } else {
        QuoteError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use test_case::test_case;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const RUB_DEPTH: &str = r#"{
        "timestamp": 1698405000,
        "asks": [{"price": "100.5", "volume": "10", "amount": "1005", "factor": "0", "type": "limit"},
                 {"price": "100.9", "volume": "1", "amount": "100.9", "factor": "0", "type": "limit"}],
        "bids": [{"price": "99.5", "volume": "10", "amount": "995", "factor": "0", "type": "limit"}]
    }"#;

    fn client_for(server: &MockServer) -> GarantexClient {
        GarantexClient::new(&GarantexConfig {
            base_url: format!("{}/api/v2/depth", server.uri()),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test_case("RUB", Some("usdtrub") ; "rub")]
    #[test_case("USD", Some("usdtusd") ; "usd")]
    #[test_case("EUR", Some("usdteur") ; "eur")]
    #[test_case("KGS", Some("usdtkgs") ; "kgs")]
    #[test_case("rub", None ; "lowercase is not a code")]
    #[test_case("INVALID", None ; "unknown code")]
    #[test_case("", None ; "empty")]
    fn market_table(code: &str, expected: Option<&str>) {
        assert_eq!(market_symbol(code), expected);
    }

    #[test]
    fn empty_base_url_uses_default() {
        let client = GarantexClient::new(&GarantexConfig {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
        })
        .unwrap();

        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn takes_first_level_of_each_side() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("market", "usdtrub"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RUB_DEPTH))
            .expect(1)
            .mount(&server)
            .await;

        let quote = client_for(&server).fetch_quote("RUB").await.unwrap();

        assert_eq!(quote.ask_price(), 100.5);
        assert_eq!(quote.bid_price(), 99.5);
        assert_eq!(quote.timestamp, Utc.timestamp_opt(1_698_405_000, 0).unwrap());
    }

    #[tokio::test]
    async fn unknown_market_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RUB_DEPTH))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_quote("INVALID").await.unwrap_err();

        assert_eq!(err, QuoteError::UnknownMarket("INVALID".to_string()));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_200_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_quote("USD").await.unwrap_err();

        assert_eq!(
            err,
            QuoteError::UnexpectedStatus("500 Internal Server Error".to_string())
        );
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_quote("EUR").await.unwrap_err();

        assert!(matches!(err, QuoteError::Decode(_)), "{err:?}");
    }

    #[test_case(r#"{"timestamp": 1, "asks": [], "bids": [{"price": "1"}]}"#, "asks" ; "no asks")]
    #[test_case(r#"{"timestamp": 1, "asks": [{"price": "1"}], "bids": []}"#, "bids" ; "no bids")]
    #[tokio::test]
    async fn empty_side_is_rejected(body: &str, side: &'static str) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_quote("KGS").await.unwrap_err();

        assert_eq!(err, QuoteError::EmptyOrderBook { side });
    }

    #[tokio::test]
    async fn malformed_price_collapses_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"timestamp": 1698405000, "asks": [{"price": "n/a"}], "bids": [{"price": "99.5"}]}"#,
            ))
            .mount(&server)
            .await;

        let quote = client_for(&server).fetch_quote("RUB").await.unwrap();

        assert!(!quote.ask.is_valid());
        assert_eq!(quote.ask_price(), 0.0);
        assert_eq!(quote.bid_price(), 99.5);
    }

    #[tokio::test]
    async fn null_price_collapses_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"timestamp": 1698405000, "asks": [{"price": null}], "bids": [{"price": "99.5"}]}"#,
            ))
            .mount(&server)
            .await;

        let quote = client_for(&server).fetch_quote("RUB").await.unwrap();

        assert_eq!(quote.ask, ParsedPrice::Invalid(String::new()));
        assert_eq!(quote.ask_price(), 0.0);
        assert_eq!(quote.bid_price(), 99.5);
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(RUB_DEPTH)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = GarantexClient::new(&GarantexConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(50),
        })
        .unwrap();

        let err = client.fetch_quote("RUB").await.unwrap_err();

        assert!(matches!(err, QuoteError::Timeout(_)), "{err:?}");
    }
}
