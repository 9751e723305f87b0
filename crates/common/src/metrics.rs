use std::sync::{Arc, OnceLock};

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

/// Process-wide counters for map/shuffle/reduce activity.
///
/// Cloning is cheap; all clones share one underlying registry. The runtime
/// records per-job totals labelled by job id so concurrent jobs in one
/// process stay distinguishable.
#[derive(Clone, Debug)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    map_records_in: CounterVec,
    map_records_emitted: CounterVec,
    shuffle_records_written: CounterVec,
    shuffle_bytes_written: CounterVec,
    reduce_groups: CounterVec,
    reduce_records_out: CounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::new()),
        }
    }

    pub fn record_map(&self, job_id: &str, records_in: u64, records_emitted: u64) {
        let labels = [job_id];
        self.inner
            .map_records_in
            .with_label_values(&labels)
            .inc_by(records_in as f64);
        self.inner
            .map_records_emitted
            .with_label_values(&labels)
            .inc_by(records_emitted as f64);
    }

    pub fn record_shuffle_write(&self, job_id: &str, records: u64, bytes: u64) {
        let labels = [job_id];
        self.inner
            .shuffle_records_written
            .with_label_values(&labels)
            .inc_by(records as f64);
        self.inner
            .shuffle_bytes_written
            .with_label_values(&labels)
            .inc_by(bytes as f64);
    }

    pub fn record_reduce(&self, job_id: &str, groups: u64, records_out: u64) {
        let labels = [job_id];
        self.inner
            .reduce_groups
            .with_label_values(&labels)
            .inc_by(groups as f64);
        self.inner
            .reduce_records_out
            .with_label_values(&labels)
            .inc_by(records_out as f64);
    }

    pub fn render_prometheus(&self) -> String {
        let metric_families = self.inner.registry.gather();
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&metric_families, &mut buf).is_err() {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
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

        let map_records_in = counter_vec(
            &registry,
            "fmr_map_records_in_total",
            "Input records seen by the per-record phase",
            &["job_id"],
        );
        let map_records_emitted = counter_vec(
            &registry,
            "fmr_map_records_emitted_total",
            "Keyed records emitted by the per-record phase",
            &["job_id"],
        );
        let shuffle_records_written = counter_vec(
            &registry,
            "fmr_shuffle_records_written_total",
            "Records written to shuffle partition files",
            &["job_id"],
        );
        let shuffle_bytes_written = counter_vec(
            &registry,
            "fmr_shuffle_bytes_written_total",
            "Bytes written to shuffle partition files",
            &["job_id"],
        );
        let reduce_groups = counter_vec(
            &registry,
            "fmr_reduce_groups_total",
            "Distinct key groups delivered to the per-key phase",
            &["job_id"],
        );
        let reduce_records_out = counter_vec(
            &registry,
            "fmr_reduce_records_out_total",
            "Output records produced by the per-key phase",
            &["job_id"],
        );

        Self {
            registry,
            map_records_in,
            map_records_emitted,
            shuffle_records_written,
            shuffle_bytes_written,
            reduce_groups,
            reduce_records_out,
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

static GLOBAL_METRICS: OnceLock<MetricsRegistry> = OnceLock::new();

pub fn global_metrics() -> &'static MetricsRegistry {
    GLOBAL_METRICS.get_or_init(MetricsRegistry::new)
}
