use flux_monitor_types::{Dimension, Severity};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// 告警管道自监控指标
pub struct PipelineMetrics {
    snapshots_collected_total: IntCounter,
    collection_failures_total: IntCounter,
    alarms_emitted_total: IntCounterVec,
    alarms_suppressed_total: IntCounterVec,
    notification_failures_total: IntCounterVec,
    store_failures_total: IntCounterVec,

    registry: Registry,
}

impl PipelineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let snapshots_collected_total = IntCounter::with_opts(Opts::new(
            "monitor_snapshots_collected_total",
            "Total number of metric snapshots stored",
        ))?;
        registry.register(Box::new(snapshots_collected_total.clone()))?;

        let collection_failures_total = IntCounter::with_opts(Opts::new(
            "monitor_collection_failures_total",
            "Total number of skipped collection ticks",
        ))?;
        registry.register(Box::new(collection_failures_total.clone()))?;

        let alarms_emitted_total = IntCounterVec::new(
            Opts::new("monitor_alarms_emitted_total", "Total number of alarms emitted"),
            &["dimension", "severity"],
        )?;
        registry.register(Box::new(alarms_emitted_total.clone()))?;

        let alarms_suppressed_total = IntCounterVec::new(
            Opts::new(
                "monitor_alarms_suppressed_total",
                "Total number of breaches suppressed by cooldown",
            ),
            &["dimension"],
        )?;
        registry.register(Box::new(alarms_suppressed_total.clone()))?;

        let notification_failures_total = IntCounterVec::new(
            Opts::new(
                "monitor_notification_failures_total",
                "Total number of failed notification deliveries",
            ),
            &["channel"],
        )?;
        registry.register(Box::new(notification_failures_total.clone()))?;

        let store_failures_total = IntCounterVec::new(
            Opts::new("monitor_store_failures_total", "Total number of failed store writes"),
            &["store"],
        )?;
        registry.register(Box::new(store_failures_total.clone()))?;

        Ok(Self {
            snapshots_collected_total,
            collection_failures_total,
            alarms_emitted_total,
            alarms_suppressed_total,
            notification_failures_total,
            store_failures_total,
            registry,
        })
    }

    pub fn record_snapshot(&self) {
        self.snapshots_collected_total.inc();
    }

    pub fn record_collection_failure(&self) {
        self.collection_failures_total.inc();
    }

    pub fn record_alarm(&self, dimension: Dimension, severity: Severity) {
        self.alarms_emitted_total
            .with_label_values(&[dimension.as_str(), severity.as_str()])
            .inc();
    }

    pub fn record_suppressed(&self, dimension: Dimension) {
        self.alarms_suppressed_total
            .with_label_values(&[dimension.as_str()])
            .inc();
    }

    pub fn record_notification_failure(&self, channel: &str) {
        self.notification_failures_total
            .with_label_values(&[channel])
            .inc();
    }

    pub fn record_store_failure(&self, store: &str) {
        self.store_failures_total.with_label_values(&[store]).inc();
    }

    pub fn snapshots_collected(&self) -> u64 {
        self.snapshots_collected_total.get()
    }

    pub fn collection_failures(&self) -> u64 {
        self.collection_failures_total.get()
    }

    pub fn alarms_emitted(&self, dimension: Dimension, severity: Severity) -> u64 {
        self.alarms_emitted_total
            .with_label_values(&[dimension.as_str(), severity.as_str()])
            .get()
    }

    pub fn alarms_suppressed(&self, dimension: Dimension) -> u64 {
        self.alarms_suppressed_total
            .with_label_values(&[dimension.as_str()])
            .get()
    }

    pub fn notification_failures(&self, channel: &str) -> u64 {
        self.notification_failures_total
            .with_label_values(&[channel])
            .get()
    }

    pub fn store_failures(&self, store: &str) -> u64 {
        self.store_failures_total.with_label_values(&[store]).get()
    }

    /// 导出 Prometheus 文本格式
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_export() {
        let metrics = PipelineMetrics::new().unwrap();

        metrics.record_snapshot();
        metrics.record_snapshot();
        metrics.record_alarm(Dimension::Cpu, Severity::Warning);
        metrics.record_suppressed(Dimension::Memory);
        metrics.record_notification_failure("email");
        metrics.record_store_failure("alarms");

        assert_eq!(metrics.snapshots_collected(), 2);
        assert_eq!(metrics.collection_failures(), 0);
        assert_eq!(metrics.alarms_emitted(Dimension::Cpu, Severity::Warning), 1);
        assert_eq!(metrics.alarms_emitted(Dimension::Cpu, Severity::Critical), 0);
        assert_eq!(metrics.alarms_suppressed(Dimension::Memory), 1);
        assert_eq!(metrics.notification_failures("email"), 1);
        assert_eq!(metrics.store_failures("alarms"), 1);

        let exported = metrics.export().unwrap();
        assert!(exported.contains("monitor_snapshots_collected_total 2"));
        assert!(exported.contains(r#"monitor_alarms_emitted_total{dimension="CPU",severity="WARNING"} 1"#));
        assert!(exported.contains("monitor_notification_failures_total"));
    }

    #[test]
    fn test_registries_are_independent() {
        let first = PipelineMetrics::new().unwrap();
        let second = PipelineMetrics::new().unwrap();

        first.record_collection_failure();

        assert_eq!(first.collection_failures(), 1);
        assert_eq!(second.collection_failures(), 0);
    }
}
