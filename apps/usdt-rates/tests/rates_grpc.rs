//! gRPC Integration Tests
//!
//! Runs the full service (lifecycle, gateway, orchestrator, Garantex client,
//! in-memory storage) against a mocked depth endpoint and drives it with the
//! generated client.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tonic::Code;
use tonic::transport::Channel;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use usdt_rates::{
    GarantexClient, GarantexConfig, InMemoryRateAdapter, LifecycleError, RateOrchestrator,
    RateStore, RpcGateway, ServiceConfig, ServiceLifecycle,
    proto::{GetRatesRequest, HealthCheckRequest, rates_service_client::RatesServiceClient},
};

const RUB_DEPTH: &str = r#"{"timestamp":1698405000,"asks":[{"price":"100.5"}],"bids":[{"price":"99.5"}]}"#;

struct TestService {
    client: RatesServiceClient<Channel>,
    storage: Arc<InMemoryRateAdapter>,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), LifecycleError>>,
}

impl TestService {
    async fn stop(self) {
        self.shutdown.cancel();
        timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("service did not stop")
            .unwrap()
            .unwrap();
    }
}

/// Start the service on a random port with quotes served by `upstream`.
async fn start_service(upstream: &MockServer) -> TestService {
    let mut config = ServiceConfig::default();
    config.server.grpc_port = 0;
    config.garantex = GarantexConfig {
        base_url: format!("{}/api/v2/depth", upstream.uri()),
        timeout: Duration::from_secs(2),
    };

    let storage = Arc::new(InMemoryRateAdapter::new());
    let quotes = Arc::new(GarantexClient::new(&config.garantex).unwrap());
    let orchestrator = RateOrchestrator::new(quotes, RateStore::new(storage.clone()));

    let lifecycle = ServiceLifecycle::bind(&config, RpcGateway::new(orchestrator), storage.clone())
        .await
        .unwrap();
    let port = lifecycle.local_addr().unwrap().port();
    let shutdown = lifecycle.shutdown_token();
    let handle = tokio::spawn(lifecycle.run());

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = RatesServiceClient::connect(format!("http://127.0.0.1:{port}"))
        .await
        .unwrap();

    TestService {
        client,
        storage,
        shutdown,
        handle,
    }
}

#[tokio::test]
async fn get_rates_returns_and_stores_top_of_book() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("market", "usdtrub"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RUB_DEPTH))
        .expect(1)
        .mount(&upstream)
        .await;
    let mut service = start_service(&upstream).await;

    let rate = service
        .client
        .get_rates(GetRatesRequest {
            target_currency: "RUB".to_string(),
        })
        .await
        .unwrap()
        .into_inner()
        .rate
        .unwrap();

    assert_eq!(rate.pair, "USDT/RUB");
    assert_eq!(rate.ask_price, 100.5);
    assert_eq!(rate.bid_price, 99.5);
    assert_eq!(rate.timestamp, "2023-10-27T11:10:00Z");

    assert_eq!(service.storage.calls().create, 1);
    let stored = service.storage.rates();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].pair(), "USDT/RUB");
    assert_eq!(stored[0].ask_price(), 100.5);

    service.stop().await;
}

#[tokio::test]
async fn unknown_currency_never_reaches_upstream_or_storage() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RUB_DEPTH))
        .expect(0)
        .mount(&upstream)
        .await;
    let mut service = start_service(&upstream).await;

    let status = service
        .client
        .get_rates(GetRatesRequest {
            target_currency: "INVALID".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("INVALID"));
    assert_eq!(service.storage.calls().create, 0);

    service.stop().await;
}

#[tokio::test]
async fn upstream_failure_is_unavailable_and_not_stored() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("market", "usdteur"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&upstream)
        .await;
    let mut service = start_service(&upstream).await;

    let status = service
        .client
        .get_rates(GetRatesRequest {
            target_currency: "EUR".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Unavailable);
    assert!(status.message().contains("500"));
    assert!(service.storage.is_empty());

    service.stop().await;
}

#[tokio::test]
async fn storage_failure_is_internal() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("market", "usdtrub"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RUB_DEPTH))
        .mount(&upstream)
        .await;
    let mut service = start_service(&upstream).await;
    service
        .storage
        .fail_with(usdt_rates::PersistenceError::Connection(
            "connection refused".to_string(),
        ));

    let status = service
        .client
        .get_rates(GetRatesRequest {
            target_currency: "RUB".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().contains("connection refused"));

    service.stop().await;
}

#[tokio::test]
async fn repeated_calls_store_one_snapshot_each() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("market", "usdtrub"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RUB_DEPTH))
        .expect(2)
        .mount(&upstream)
        .await;
    let mut service = start_service(&upstream).await;

    for _ in 0..2 {
        service
            .client
            .get_rates(GetRatesRequest {
                target_currency: "RUB".to_string(),
            })
            .await
            .unwrap();
    }

    assert_eq!(service.storage.len(), 2);

    service.stop().await;
}

#[tokio::test]
async fn health_check_is_ok_without_touching_dependencies() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let mut service = start_service(&upstream).await;

    let status = service
        .client
        .health_check(HealthCheckRequest {})
        .await
        .unwrap()
        .into_inner()
        .status;

    assert_eq!(status, "OK");
    assert_eq!(service.storage.calls().create, 0);

    service.stop().await;
}

#[tokio::test]
async fn health_check_is_ok_while_storage_is_down() {
    let upstream = MockServer::start().await;
    let mut service = start_service(&upstream).await;
    service
        .storage
        .fail_with(usdt_rates::PersistenceError::Connection(
            "connection refused".to_string(),
        ));

    let status = service
        .client
        .health_check(HealthCheckRequest {})
        .await
        .unwrap()
        .into_inner()
        .status;

    assert_eq!(status, "OK");

    service.stop().await;
}

#[tokio::test]
async fn shutdown_closes_storage_and_refuses_new_calls() {
    let upstream = MockServer::start().await;
    let service = start_service(&upstream).await;
    let storage = Arc::clone(&service.storage);
    let mut client = service.client.clone();

    service.stop().await;

    assert!(storage.is_closed());
    assert_eq!(storage.calls().close, 1);
    let after = timeout(
        Duration::from_secs(2),
        client.health_check(HealthCheckRequest {}),
    )
    .await;
    assert!(matches!(after, Err(_) | Ok(Err(_))));
}
