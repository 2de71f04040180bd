use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;

use crate::app::AppState;

/// Request and response counters for the whole pipeline, exposed on
/// `GET /v1/metrics` in the Prometheus text format.
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    registry: Registry,
    requests_received: IntCounter,
    responses_sent: IntCounter,
    processing_time_us: IntCounter,
    responses_by_status: IntCounterVec,
}

impl HttpMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("greenlight".to_string()), None)?;

        let requests_received = IntCounter::with_opts(Opts::new(
            "requests_received_total",
            "Total HTTP requests received.",
        ))?;
        let responses_sent = IntCounter::with_opts(Opts::new(
            "responses_sent_total",
            "Total HTTP responses sent.",
        ))?;
        let processing_time_us = IntCounter::with_opts(Opts::new(
            "processing_time_microseconds_total",
            "Cumulative time spent producing responses, in microseconds.",
        ))?;
        let responses_by_status = IntCounterVec::new(
            Opts::new(
                "responses_sent_by_status_total",
                "Total HTTP responses sent, partitioned by status code.",
            ),
            &["status"],
        )?;

        registry.register(Box::new(requests_received.clone()))?;
        registry.register(Box::new(responses_sent.clone()))?;
        registry.register(Box::new(processing_time_us.clone()))?;
        registry.register(Box::new(responses_by_status.clone()))?;

        Ok(Self {
            registry,
            requests_received,
            responses_sent,
            processing_time_us,
            responses_by_status,
        })
    }

    pub fn request_received(&self) {
        self.requests_received.inc();
    }

    pub fn response_sent(&self, status: u16, elapsed_us: u64) {
        self.responses_sent.inc();
        self.processing_time_us.inc_by(elapsed_us);
        self.responses_by_status
            .with_label_values(&[status.to_string().as_str()])
            .inc();
    }

    /// Render every registered metric in the text exposition format
    pub fn encode(&self) -> prometheus::Result<(String, String)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((
            encoder.format_type().to_string(),
            String::from_utf8_lossy(&buffer).into_owned(),
        ))
    }
}

/// Count every request and response, rejected or not. Sits outside every
/// other layer so rate-limited and panicking requests are counted too.
pub async fn track_metrics(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    state.metrics.request_received();

    let response = next.run(request).await;

    let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    state.metrics.response_sent(response.status().as_u16(), elapsed_us);
    response
}
