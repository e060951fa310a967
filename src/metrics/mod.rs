use prometheus::{Counter, Encoder, Histogram, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::error::{Result, TokenDbError};

/// Prometheus metrics for the storage engine
#[derive(Clone)]
pub struct EngineMetrics {
    // Counters
    pub records_created: Counter,
    pub records_updated: Counter,
    pub records_deleted: Counter,
    pub queries_total: Counter,
    pub ghost_references: Counter,

    // Histograms
    pub write_latency: HistogramVec,
    pub query_scanned: Histogram,

    // Registry
    registry: Arc<Registry>,
}

impl EngineMetrics {
    /// Create a new EngineMetrics instance with its own registry
    pub fn new() -> std::result::Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Counters
        let records_created = Counter::with_opts(Opts::new(
            "tokendb_records_created_total",
            "Total number of records created",
        ))?;
        registry.register(Box::new(records_created.clone()))?;

        let records_updated = Counter::with_opts(Opts::new(
            "tokendb_records_updated_total",
            "Total number of records updated",
        ))?;
        registry.register(Box::new(records_updated.clone()))?;

        let records_deleted = Counter::with_opts(Opts::new(
            "tokendb_records_deleted_total",
            "Total number of records deleted",
        ))?;
        registry.register(Box::new(records_deleted.clone()))?;

        let queries_total = Counter::with_opts(Opts::new(
            "tokendb_queries_total",
            "Total number of filtered queries",
        ))?;
        registry.register(Box::new(queries_total.clone()))?;

        let ghost_references = Counter::with_opts(Opts::new(
            "tokendb_ghost_references_total",
            "Posted dense ids skipped because no record could be resolved",
        ))?;
        registry.register(Box::new(ghost_references.clone()))?;

        // Histograms
        let write_latency = HistogramVec::new(
            HistogramOpts::new("tokendb_write_latency_seconds", "Write operation latency")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0]),
            &["op"],
        )?;
        registry.register(Box::new(write_latency.clone()))?;

        let query_scanned = Histogram::with_opts(
            HistogramOpts::new(
                "tokendb_query_scanned",
                "Sum of per-field posting cardinalities touched by a query",
            )
            .buckets(vec![1.0, 10.0, 100.0, 1000.0, 10_000.0, 100_000.0]),
        )?;
        registry.register(Box::new(query_scanned.clone()))?;

        Ok(Self {
            records_created,
            records_updated,
            records_deleted,
            queries_total,
            ghost_references,
            write_latency,
            query_scanned,
            registry: Arc::new(registry),
        })
    }

    pub fn record_create(&self, duration_secs: f64) {
        self.records_created.inc();
        self.write_latency
            .with_label_values(&["create"])
            .observe(duration_secs);
    }

    pub fn record_update(&self, duration_secs: f64) {
        self.records_updated.inc();
        self.write_latency
            .with_label_values(&["update"])
            .observe(duration_secs);
    }

    pub fn record_delete(&self, duration_secs: f64) {
        self.records_deleted.inc();
        self.write_latency
            .with_label_values(&["delete"])
            .observe(duration_secs);
    }

    pub fn record_query(&self, scanned: u64) {
        self.queries_total.inc();
        self.query_scanned.observe(scanned as f64);
    }

    pub fn record_ghost(&self) {
        self.ghost_references.inc();
    }

    /// Render every registered metric in the text exposition format
    pub fn gather(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| TokenDbError::Internal(format!("metrics encoding failed: {}", e)))?;
        String::from_utf8(buf).map_err(|e| TokenDbError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_exposition() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.record_create(0.002);
        metrics.record_create(0.003);
        metrics.record_delete(0.001);
        metrics.record_query(42);
        metrics.record_ghost();

        assert_eq!(metrics.records_created.get(), 2.0);
        assert_eq!(metrics.records_updated.get(), 0.0);

        let text = metrics.gather().unwrap();
        assert!(text.contains("tokendb_records_created_total 2"));
        assert!(text.contains("tokendb_ghost_references_total 1"));
        assert!(text.contains("tokendb_write_latency_seconds_count{op=\"create\"} 2"));
        assert!(text.contains("tokendb_query_scanned_sum 42"));
    }

    #[test]
    fn test_registries_are_independent() {
        let a = EngineMetrics::new().unwrap();
        let b = EngineMetrics::new().unwrap();
        a.record_query(1);
        assert_eq!(a.queries_total.get(), 1.0);
        assert_eq!(b.queries_total.get(), 0.0);
    }
}
