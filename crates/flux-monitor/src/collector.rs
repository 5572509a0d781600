use async_trait::async_trait;
use flux_monitor_store::MetricStore;
use flux_monitor_types::MetricSnapshot;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::scheduler::PeriodicTask;
use crate::source::MetricSource;

/// 指标采集器：从指标源拉取快照并写入指标存储
pub struct MetricCollector {
    service_name: String,
    source: Arc<dyn MetricSource>,
    store: Arc<dyn MetricStore>,
    metrics: Arc<PipelineMetrics>,
}

impl MetricCollector {
    pub fn new(
        service_name: impl Into<String>,
        source: Arc<dyn MetricSource>,
        store: Arc<dyn MetricStore>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            source,
            store,
            metrics,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// 立即采集一次，返回写入的记录 ID
    pub async fn collect_now(&self) -> Result<i64> {
        let sample = match self.source.fetch().await {
            Ok(sample) => sample,
            Err(e) => {
                self.metrics.record_collection_failure();
                return Err(e.into());
            }
        };

        let snapshot = MetricSnapshot::new(
            self.service_name.clone(),
            sample.cpu,
            sample.memory,
            sample.requests,
        );

        let id = match self.store.append_metric(&snapshot).await {
            Ok(id) => id,
            Err(e) => {
                self.metrics.record_collection_failure();
                self.metrics.record_store_failure("metrics");
                return Err(e.into());
            }
        };

        self.metrics.record_snapshot();
        debug!(
            id,
            service = %self.service_name,
            source = %self.source.name(),
            cpu = snapshot.cpu,
            memory = snapshot.memory,
            requests = snapshot.requests,
            "Metric snapshot stored"
        );

        Ok(id)
    }
}

#[async_trait]
impl PeriodicTask for MetricCollector {
    fn name(&self) -> &str {
        "metric-collector"
    }

    async fn run_tick(&self) -> Result<()> {
        if let Err(e) = self.collect_now().await {
            warn!(service = %self.service_name, error = %e, "Metric collection skipped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MonitorError, SourceError};
    use crate::source::MetricSample;
    use flux_monitor_store::{MemoryStore, MetricQuery};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetricSource for Scripted {
        async fn fetch(&self) -> std::result::Result<MetricSample, SourceError> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                1 => Err(SourceError::Payload("missing field `cpu`".to_string())),
                n => Ok(MetricSample {
                    cpu: 10.0 * (n + 1) as f64,
                    memory: 50.0,
                    requests: 300.0,
                }),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn collector(store: &MemoryStore) -> (MetricCollector, Arc<PipelineMetrics>) {
        let metrics = Arc::new(PipelineMetrics::new().unwrap());
        let collector = MetricCollector::new(
            "order-service",
            Arc::new(Scripted {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(store.clone()),
            metrics.clone(),
        );
        (collector, metrics)
    }

    #[tokio::test]
    async fn test_collect_now_appends_snapshot() {
        let store = MemoryStore::new();
        let (collector, metrics) = collector(&store);

        let id = collector.collect_now().await.unwrap();

        let latest = store.latest_metric().await.unwrap().unwrap();
        assert_eq!(latest.id, id);
        assert_eq!(latest.snapshot.service_name, "order-service");
        assert_eq!(latest.snapshot.cpu, 10.0);
        assert_eq!(metrics.snapshots_collected(), 1);
    }

    #[tokio::test]
    async fn test_failed_tick_is_skipped() {
        let store = MemoryStore::new();
        let (collector, metrics) = collector(&store);

        collector.run_tick().await.unwrap();
        // 第二次采集返回异常载荷
        collector.run_tick().await.unwrap();
        collector.run_tick().await.unwrap();

        assert_eq!(store.metric_count().await, 2);
        assert_eq!(metrics.collection_failures(), 1);

        let page = store.query_metrics(&MetricQuery::new()).await.unwrap();
        assert_eq!(page.items[0].snapshot.cpu, 30.0);
    }

    #[tokio::test]
    async fn test_collect_now_surfaces_source_error() {
        let store = MemoryStore::new();
        let (collector, _) = collector(&store);

        collector.collect_now().await.unwrap();
        let err = collector.collect_now().await.unwrap_err();

        assert!(matches!(err, MonitorError::Source(SourceError::Payload(_))));
    }
}
