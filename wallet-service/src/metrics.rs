use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct WalletMetrics {
    registry: Registry,
    initializations: IntCounterVec,
    verifications: IntCounterVec,
    webhook_events: IntCounterVec,
    http_errors: IntCounterVec,
}

impl WalletMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let initializations = IntCounterVec::new(
            Opts::new(
                "wallet_funding_initializations_total",
                "Count of funding initializations grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(initializations.clone()))?;

        let verifications = IntCounterVec::new(
            Opts::new(
                "wallet_funding_verifications_total",
                "Count of funding verifications grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(verifications.clone()))?;

        let webhook_events = IntCounterVec::new(
            Opts::new(
                "wallet_gateway_webhook_events_total",
                "Count of gateway webhook deliveries grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(webhook_events.clone()))?;

        let http_errors = IntCounterVec::new(
            Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)",
            ),
            &["code", "status"],
        )?;
        registry.register(Box::new(http_errors.clone()))?;

        Ok(Self {
            registry,
            initializations,
            verifications,
            webhook_events,
            http_errors,
        })
    }

    pub fn initialization(&self, outcome: &str) {
        self.initializations.with_label_values(&[outcome]).inc();
    }

    pub fn verification(&self, outcome: &str) {
        self.verifications.with_label_values(&[outcome]).inc();
    }

    pub fn webhook_event(&self, outcome: &str) {
        self.webhook_events.with_label_values(&[outcome]).inc();
    }

    pub fn http_error(&self, code: &str, status: &str) {
        self.http_errors.with_label_values(&[code, status]).inc();
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
