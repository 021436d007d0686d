//! # Request Metrics
//!
//! Prometheus registry for HTTP request and error counters and the quote
//! counter, encoded with the text exposition format at `/metrics`.

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_errors_total: IntCounterVec,
    quotes_total: IntCounter,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .field("quotes", &self.quotes())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("landed_http_requests_total", "Total HTTP requests"),
            &["method"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new(
                "landed_http_errors_total",
                "HTTP responses with a 4xx or 5xx status",
            ),
            &["class"],
        )
        .expect("metric can be created");

        let quotes_total = IntCounter::new("landed_quotes_total", "Quotes successfully calculated")
            .expect("metric can be created");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_errors_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(quotes_total.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_errors_total,
                quotes_total,
            }),
        }
    }

    /// Total request count across all methods.
    pub fn requests(&self) -> u64 {
        sum(&self.inner.http_requests_total)
    }

    /// Total error count (4xx and 5xx).
    pub fn errors(&self) -> u64 {
        sum(&self.inner.http_errors_total)
    }

    /// Number of quotes successfully produced.
    pub fn quotes(&self) -> u64 {
        self.inner.quotes_total.get()
    }

    /// Count a successful quote.
    pub fn record_quote(&self) {
        self.inner.quotes_total.inc();
    }

    fn record_request(&self, method: &str, status: axum::http::StatusCode) {
        self.inner
            .http_requests_total
            .with_label_values(&[method])
            .inc();

        let class = if status.is_client_error() {
            "4xx"
        } else if status.is_server_error() {
            "5xx"
        } else {
            return;
        };
        self.inner
            .http_errors_total
            .with_label_values(&[class])
            .inc();
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

fn sum(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware that records request and error counts.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(&method, response.status());
    }

    response
}
