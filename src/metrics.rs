// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for submissions.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::warn;

/// Submission metrics, each instance with its own registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    render_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let submissions = IntCounterVec::new(
            Opts::new(
                "confession_submissions_total",
                "Confession submissions by outcome",
            ),
            &["outcome"],
        )?;
        let render_failures = IntCounter::new(
            "confession_render_failures_total",
            "Confessions sent without an image because rendering failed",
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(render_failures.clone()))?;

        Ok(Self {
            registry,
            submissions,
            render_failures,
        })
    }

    /// Count a submission with outcome `sent`, `invalid`, `rate_limited` or `transport_failed`.
    pub fn record_outcome(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    pub fn record_render_failure(&self) {
        self.render_failures.inc();
    }

    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[outcome]).get()
    }

    /// Text exposition format.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_counted() {
        let metrics = Metrics::new().unwrap();
        metrics.record_outcome("sent");
        metrics.record_outcome("sent");
        metrics.record_outcome("invalid");
        assert_eq!(metrics.outcome_count("sent"), 2);
        assert_eq!(metrics.outcome_count("invalid"), 1);
        assert_eq!(metrics.outcome_count("rate_limited"), 0);
    }

    #[test]
    fn test_instances_use_separate_registries() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.record_outcome("sent");
        assert_eq!(first.outcome_count("sent"), 1);
        assert_eq!(second.outcome_count("sent"), 0);
    }

    #[test]
    fn test_exposition() {
        let metrics = Metrics::new().unwrap();
        metrics.record_outcome("rate_limited");
        metrics.record_render_failure();

        let text = metrics.render();
        assert!(text.contains("confession_submissions_total{outcome=\"rate_limited\"} 1"));
        assert!(text.contains("confession_render_failures_total 1"));
    }
}
