//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Snapshot outcomes are labelled with `completed` or the failing stage.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Outcome label recorded for successful snapshots.
pub const OUTCOME_COMPLETED: &str = "completed";

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    snapshots_total: IntCounterVec,
    snapshot_files_written_total: IntCounter,
}

/// Snapshot of selected counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Snapshots that completed successfully.
    pub snapshots_completed: u64,
    /// Files written across all snapshots, including those of failed runs.
    pub files_written: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "http_requests_total",
            source,
        })?;
        let snapshots_total = IntCounterVec::new(
            Opts::new("snapshots_total", "Snapshot operations by outcome"),
            &["outcome"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "snapshots_total",
            source,
        })?;
        let snapshot_files_written_total = IntCounter::with_opts(Opts::new(
            "snapshot_files_written_total",
            "Files written into the destination store",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "snapshot_files_written_total",
            source,
        })?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "snapshots_total", &snapshots_total)?;
        register(
            &registry,
            "snapshot_files_written_total",
            &snapshot_files_written_total,
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                snapshots_total,
                snapshot_files_written_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Record the terminal outcome of one snapshot.
    pub fn inc_snapshot(&self, outcome: &str) {
        self.inner
            .snapshots_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Count one file written into the destination store.
    pub fn inc_file_written(&self) {
        self.inner.snapshot_files_written_total.inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the snapshot counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            snapshots_completed: self
                .inner
                .snapshots_total
                .with_label_values(&[OUTCOME_COMPLETED])
                .get(),
            files_written: self.inner.snapshot_files_written_total.get(),
        }
    }
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}
