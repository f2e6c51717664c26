//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `ledger_ticket_checks_total` - Ticket lookups served
//! - `ledger_distributions_total` - Successful distribution writes
//! - `ledger_noop_updates_total` - Distributions rejected as no-op
//! - `ledger_busy_rejections_total` - Writes rejected because the writer was saturated
//! - `ledger_write_duration_seconds` - Read-merge-write latency
//! - `ledger_records` - Records seen in the last full load

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Ticket lookups served
    pub ticket_checks: IntCounter,

    /// Successful distribution writes
    pub distributions: IntCounter,

    /// Distributions rejected as no-op
    pub noop_updates: IntCounter,

    /// Writes rejected as busy
    pub busy_rejections: IntCounter,

    /// Read-merge-write latency
    pub write_duration: Histogram,

    /// Records in the last full load
    pub records: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector on a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let ticket_checks = IntCounter::new("ledger_ticket_checks_total", "Ticket lookups served")?;
        registry.register(Box::new(ticket_checks.clone()))?;

        let distributions = IntCounter::new(
            "ledger_distributions_total",
            "Successful distribution writes",
        )?;
        registry.register(Box::new(distributions.clone()))?;

        let noop_updates = IntCounter::new(
            "ledger_noop_updates_total",
            "Distributions rejected because nothing was left to apply",
        )?;
        registry.register(Box::new(noop_updates.clone()))?;

        let busy_rejections = IntCounter::new(
            "ledger_busy_rejections_total",
            "Writes rejected because the writer was saturated",
        )?;
        registry.register(Box::new(busy_rejections.clone()))?;

        let write_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_write_duration_seconds",
                "Read-merge-write latency",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(write_duration.clone()))?;

        let records = IntGauge::new("ledger_records", "Records in the last full load")?;
        registry.register(Box::new(records.clone()))?;

        Ok(Self {
            ticket_checks,
            distributions,
            noop_updates,
            busy_rejections,
            write_duration,
            records,
            registry,
        })
    }

    /// Record a write and its latency
    pub fn record_distribution(&self, duration_seconds: f64) {
        self.distributions.inc();
        self.write_duration.observe(duration_seconds);
    }

    /// Update record count
    pub fn update_records(&self, count: usize) {
        self.records.set(count as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition
    pub fn export(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
