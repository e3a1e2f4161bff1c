//! gRPC Server Implementation
//!
//! [`RpcGateway`] exposes `GetRates` and `HealthCheck` and translates between
//! wire messages and the application layer.

use chrono::SecondsFormat;
use tonic::{Code, Request, Response, Status};

use super::proto::usdt::v1::{
    self as proto, GetRatesRequest, GetRatesResponse, HealthCheckRequest, HealthCheckResponse,
    rates_service_server::RatesService,
};
use crate::application::ports::QuoteError;
use crate::application::services::{RateOrchestrator, RateServiceError};
use crate::domain::rate::CurrencyRate;
use crate::infrastructure::metrics::{self, Method, Outcome};

/// Status text returned by `HealthCheck`.
pub const HEALTH_OK: &str = "OK";

/// gRPC front end for the rate service.
#[derive(Debug, Clone)]
pub struct RpcGateway {
    service: RateOrchestrator,
}

impl RpcGateway {
    /// Create a gateway over an orchestrator.
    #[must_use]
    pub const fn new(service: RateOrchestrator) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl RatesService for RpcGateway {
    async fn get_rates(
        &self,
        request: Request<GetRatesRequest>,
    ) -> Result<Response<GetRatesResponse>, Status> {
        let target = request.into_inner().target_currency;

        match self.service.get_rates(&target).await {
            Ok(rate) => {
                metrics::record_request(Method::GetRates, Outcome::Ok);
                Ok(Response::new(GetRatesResponse {
                    rate: Some(to_proto(&rate)),
                }))
            }
            Err(err) => {
                tracing::error!(currency = %target, error = %err, "GetRates failed");
                metrics::record_request(Method::GetRates, Outcome::Error);
                if let RateServiceError::Quote(quote_err) = &err {
                    metrics::record_quote_error(quote_err.kind());
                }
                Err(status_from_error(&err))
            }
        }
    }

    async fn health_check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        metrics::record_request(Method::HealthCheck, Outcome::Ok);
        Ok(Response::new(HealthCheckResponse {
            status: HEALTH_OK.to_string(),
        }))
    }
}

/// Map a service error to a status. The message is the full error text.
#[must_use]
pub fn status_from_error(err: &RateServiceError) -> Status {
    let code = match err {
        RateServiceError::Quote(QuoteError::UnknownMarket(_)) => Code::InvalidArgument,
        RateServiceError::Quote(QuoteError::Timeout(_)) => Code::DeadlineExceeded,
        RateServiceError::Quote(
            QuoteError::Transport(_)
            | QuoteError::UnexpectedStatus(_)
            | QuoteError::Decode(_)
            | QuoteError::EmptyOrderBook { .. },
        ) => Code::Unavailable,
        RateServiceError::Store(_) => Code::Internal,
    };
    Status::new(code, err.to_string())
}

fn to_proto(rate: &CurrencyRate) -> proto::CurrencyRate {
    proto::CurrencyRate {
        pair: rate.pair().to_string(),
        ask_price: rate.ask_price(),
        bid_price: rate.bid_price(),
        timestamp: rate.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

// =============================================================================
// Tests
// =============================================================================
