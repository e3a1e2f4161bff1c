//! Rates Client
//!
//! Smoke-test client for a running service: checks health, then asks for one
//! rate and prints it.
//!
//! ```bash
//! cargo run --bin rates-client -- --addr http://localhost:50051 --currency RUB
//! ```

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use usdt_rates::proto::rates_service_client::RatesServiceClient;
use usdt_rates::proto::{GetRatesRequest, HealthCheckRequest};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "rates-client", version, about = "Query a running USDT rates service")]
struct Args {
    /// Service address.
    #[arg(long, default_value = "http://localhost:50051")]
    addr: String,

    /// Market code to query.
    #[arg(long, default_value = "EUR")]
    currency: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut client = RatesServiceClient::connect(args.addr.clone())
        .await
        .with_context(|| format!("could not connect to {}", args.addr))?;

    let health = tokio::time::timeout(
        HEALTH_CHECK_TIMEOUT,
        client.health_check(HealthCheckRequest {}),
    )
    .await
    .context("HealthCheck timed out")?
    .context("HealthCheck failed")?
    .into_inner();
    println!("HealthCheck status: {}", health.status);

    let response = client
        .get_rates(GetRatesRequest {
            target_currency: args.currency,
        })
        .await
        .context("could not get rates")?
        .into_inner();

    let rate = response.rate.unwrap_or_default();
    println!("Currency pair: {}", rate.pair);
    println!("Ask Price: {:.6}", rate.ask_price);
    println!("Bid Price: {:.6}", rate.bid_price);
    println!("Timestamp: {}", rate.timestamp);

    Ok(())
}
