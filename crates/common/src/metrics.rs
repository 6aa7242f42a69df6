use std::sync::{Arc, OnceLock};

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

#[derive(Clone, Debug)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    operator_batches_observed: CounterVec,
    operator_schema_changes: CounterVec,
    operator_schema_version: GaugeVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::new()),
        }
    }

    pub fn record_batch_observed(&self, query_id: &str, operator: &str) {
        self.inner
            .operator_batches_observed
            .with_label_values(&[query_id, operator])
            .inc();
    }

    pub fn record_schema_change(&self, query_id: &str, operator: &str) {
        self.inner
            .operator_schema_changes
            .with_label_values(&[query_id, operator])
            .inc();
    }

    pub fn set_schema_version(&self, query_id: &str, operator: &str, version: u64) {
        self.inner
            .operator_schema_version
            .with_label_values(&[query_id, operator])
            .set(version as f64);
    }

    pub fn render_prometheus(&self) -> String {
        let metric_families = self.inner.registry.gather();
        let mut out = Vec::new();
        let enc = TextEncoder::new();
        if enc.encode(&metric_families, &mut out).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&out).to_string()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsInner {
    fn new() -> Self {
        let registry = Registry::new();

        let operator_batches_observed = counter_vec(
            &registry,
            "veloq_operator_batches_observed_total",
            "Batches observed by schema-tracking operators",
            &["query_id", "operator"],
        );
        let operator_schema_changes = counter_vec(
            &registry,
            "veloq_operator_schema_changes_total",
            "Schema changes detected per operator",
            &["query_id", "operator"],
        );
        let operator_schema_version = gauge_vec(
            &registry,
            "veloq_operator_schema_version",
            "Current schema version per operator",
            &["query_id", "operator"],
        );

        Self {
            registry,
            operator_batches_observed,
            operator_schema_changes,
            operator_schema_version,
        }
    }
}

fn counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let c = CounterVec::new(Opts::new(name, help), labels).expect("counter vec");
    registry
        .register(Box::new(c.clone()))
        .expect("register counter");
    c
}

fn gauge_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> GaugeVec {
    let g = GaugeVec::new(Opts::new(name, help), labels).expect("gauge vec");
    registry
        .register(Box::new(g.clone()))
        .expect("register gauge");
    g
}

static GLOBAL_METRICS: OnceLock<MetricsRegistry> = OnceLock::new();

pub fn global_metrics() -> &'static MetricsRegistry {
    GLOBAL_METRICS.get_or_init(MetricsRegistry::new)
}
