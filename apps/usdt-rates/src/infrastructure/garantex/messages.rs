//! Garantex depth API payloads.

use serde::Deserialize;

/// Body of `GET /api/v2/depth?market=<symbol>`.
#[derive(Debug, Clone, Deserialize)]
pub struct DepthResponse {
    /// Unix seconds of the snapshot.
    #[serde(default)]
    pub timestamp: i64,
    /// Ask side, best first.
    #[serde(default)]
    pub asks: Vec<DepthLevel>,
    /// Bid side, best first.
    #[serde(default)]
    pub bids: Vec<DepthLevel>,
}

/// One order-book level. Numbers arrive as decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub struct DepthLevel {
    /// Price. `null` and a missing field both decode as `None`.
    #[serde(default)]
    pub price: Option<String>,
    /// Volume in the base asset.
    #[serde(default)]
    pub volume: Option<String>,
    /// Amount in the quote asset.
    #[serde(default)]
    pub amount: Option<String>,
    /// Price factor relative to the reference rate.
    #[serde(default)]
    pub factor: Option<String>,
    /// Level type, e.g. `"limit"` or `"factor"`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl DepthResponse {
    /// First ask level, if any.
    #[must_use]
    pub fn best_ask(&self) -> Option<&DepthLevel> {
        self.asks.first()
    }

    /// First bid level, if any.
    #[must_use]
    pub fn best_bid(&self) -> Option<&DepthLevel> {
        self.bids.first()
    }
}
