// @generated
// This file is @generated by prost-build.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct GetRatesRequest {
    /// Three-letter currency code, e.g. "RUB".
    #[prost(string, tag = "1")]
    pub target_currency: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CurrencyRate {
    /// Currency pair, e.g. "USDT/RUB".
    #[prost(string, tag = "1")]
    pub pair: ::prost::alloc::string::String,
    #[prost(double, tag = "2")]
    pub ask_price: f64,
    #[prost(double, tag = "3")]
    pub bid_price: f64,
    /// Quote time as RFC 3339 text.
    #[prost(string, tag = "4")]
    pub timestamp: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRatesResponse {
    #[prost(message, optional, tag = "1")]
    pub rate: ::core::option::Option<CurrencyRate>,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct HealthCheckRequest {}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct HealthCheckResponse {
    #[prost(string, tag = "1")]
    pub status: ::prost::alloc::string::String,
}
// @@protoc_insertion_point(module)
include!("usdt.v1.tonic.rs");
