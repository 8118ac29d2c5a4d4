//! Prometheus metrics for the cart service.
//!
//! Exposed at `/metrics` in Prometheus text format:
//! - `store_failures_total` / `store_latency_seconds`: key-value store calls
//! - `gateway_failures_total` / `gateway_latency_seconds`: payment gateway calls
//! - `http_requests_total{method,path,status}` and
//!   `http_request_duration_seconds{method,path}`: HTTP traffic, `/metrics` excluded
//!
//! Latency gauges hold the duration of the most recent successful call.
//! Each `Metrics` owns its registry, so separate app instances never share
//! counters.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use cart_core::{CartError, CartResult};
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

pub const METRICS_PATH: &str = "/metrics";

pub struct Metrics {
    registry: Registry,
    pub store_failures: IntCounter,
    pub store_latency: Gauge,
    pub gateway_failures: IntCounter,
    pub gateway_latency: Gauge,
    pub http_requests: IntCounterVec,
    pub http_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let store_failures =
            IntCounter::new("store_failures_total", "Total number of key-value store failures")?;
        let store_latency =
            Gauge::new("store_latency_seconds", "Key-value store operation latency in seconds")?;
        let gateway_failures =
            IntCounter::new("gateway_failures_total", "Total number of payment gateway failures")?;
        let gateway_latency =
            Gauge::new("gateway_latency_seconds", "Payment gateway operation latency in seconds")?;
        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency in seconds"),
            &["method", "path"],
        )?;

        registry.register(Box::new(store_failures.clone()))?;
        registry.register(Box::new(store_latency.clone()))?;
        registry.register(Box::new(gateway_failures.clone()))?;
        registry.register(Box::new(gateway_latency.clone()))?;
        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_duration.clone()))?;

        Ok(Self {
            registry,
            store_failures,
            store_latency,
            gateway_failures,
            gateway_latency,
            http_requests,
            http_duration,
        })
    }

    /// Time a store call; count it if the store failed.
    pub async fn observe_store<T>(&self, call: impl Future<Output = CartResult<T>>) -> CartResult<T> {
        observe(&self.store_latency, &self.store_failures, CartError::is_store_failure, call).await
    }

    /// Time a gateway call; count it if the gateway failed.
    pub async fn observe_gateway<T>(
        &self,
        call: impl Future<Output = CartResult<T>>,
    ) -> CartResult<T> {
        observe(&self.gateway_latency, &self.gateway_failures, CartError::is_gateway_failure, call)
            .await
    }

    /// Render all metrics in Prometheus text format.
    pub fn render(&self) -> Result<(String, String), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        let body = String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics are not UTF-8: {}", e)))?;
        Ok((encoder.format_type().to_string(), body))
    }
}

async fn observe<T>(
    latency: &Gauge,
    failures: &IntCounter,
    is_failure: fn(&CartError) -> bool,
    call: impl Future<Output = CartResult<T>>,
) -> CartResult<T> {
    let started = Instant::now();
    let result = call.await;
    match &result {
        Ok(_) => latency.set(started.elapsed().as_secs_f64()),
        Err(e) if is_failure(e) => failures.inc(),
        Err(_) => {}
    }
    result
}

/// Route-level middleware recording request count and latency.
pub async fn track_http(
    State(metrics): State<Arc<Metrics>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if path == METRICS_PATH {
        return next.run(request).await;
    }

    let method = request.method().to_string();
    let started = Instant::now();
    let response = next.run(request).await;

    metrics
        .http_duration
        .with_label_values(&[method.as_str(), path.as_str()])
        .observe(started.elapsed().as_secs_f64());
    metrics
        .http_requests
        .with_label_values(&[method.as_str(), path.as_str(), response.status().as_str()])
        .inc();

    response
}
