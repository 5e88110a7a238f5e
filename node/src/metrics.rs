//! # Prometheus Metrics
//!
//! Counters and latency histograms for the two demo actions, scraped at
//! `/metrics` on the metrics port. Everything is registered in a dedicated
//! [`prometheus::Registry`] with the `qrdid` prefix.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::Arc;

/// Latency buckets in seconds. Registration sits around the confirmation
/// delay; explanations depend on the model.
const LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 3.0, 5.0, 10.0, 30.0];

/// All metric handles for the node. Handles are cheap clones.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Registrations that reached the ledger and confirmed.
    pub registrations_total: IntCounter,
    /// Registrations the ledger rejected.
    pub registration_failures_total: IntCounter,
    /// Explanations rendered from model text.
    pub explanations_total: IntCounter,
    /// Explanations that fell back to a fixed message.
    pub explanation_failures_total: IntCounter,
    /// Actions refused by a guard (trigger disabled, nothing to explain).
    pub guard_rejections_total: IntCounter,
    pub registration_latency_seconds: Histogram,
    pub explanation_latency_seconds: Histogram,
}

fn register<M: Collector + Clone + 'static>(
    registry: &Registry,
    metric: M,
) -> Result<M, prometheus::Error> {
    registry.register(Box::new(metric.clone()))?;
    Ok(metric)
}

impl NodeMetrics {
    /// Create and register all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("qrdid".into()), None)?;

        let registrations_total = register(
            &registry,
            IntCounter::new("registrations_total", "Completed DID registrations")?,
        )?;
        let registration_failures_total = register(
            &registry,
            IntCounter::new(
                "registration_failures_total",
                "DID registrations rejected by the ledger",
            )?,
        )?;
        let explanations_total = register(
            &registry,
            IntCounter::new("explanations_total", "Explanations generated by the model")?,
        )?;
        let explanation_failures_total = register(
            &registry,
            IntCounter::new(
                "explanation_failures_total",
                "Explanation requests that ended in a fallback message",
            )?,
        )?;
        let guard_rejections_total = register(
            &registry,
            IntCounter::new(
                "guard_rejections_total",
                "Actions refused because their trigger was disabled or nothing was registered",
            )?,
        )?;
        let registration_latency_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "registration_latency_seconds",
                    "Wall time of one registration run",
                )
                .buckets(LATENCY_BUCKETS.to_vec()),
            )?,
        )?;
        let explanation_latency_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "explanation_latency_seconds",
                    "Wall time of one explanation request",
                )
                .buckets(LATENCY_BUCKETS.to_vec()),
            )?,
        )?;

        Ok(Self {
            registry,
            registrations_total,
            registration_failures_total,
            explanations_total,
            explanation_failures_total,
            guard_rejections_total,
            registration_latency_seconds,
            explanation_latency_seconds,
        })
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics handle passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// `GET /metrics`.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_lists_prefixed_metrics() {
        let m = NodeMetrics::new().unwrap();
        m.registrations_total.inc();
        m.registration_latency_seconds.observe(3.0);
        let text = m.encode().unwrap();
        assert!(text.contains("qrdid_registrations_total 1"));
        assert!(text.contains("qrdid_registration_latency_seconds_bucket"));
        assert!(text.contains("qrdid_guard_rejections_total 0"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        // Each node owns its registry, so building twice must not fail
        // with a duplicate-registration error.
        assert!(NodeMetrics::new().is_ok());
        assert!(NodeMetrics::new().is_ok());
    }
}
