use async_trait::async_trait;
use flux_monitor_types::{Alarm, MetricSnapshot, StoredAlarm, StoredMetric};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::query::{AlarmQuery, AlarmSummary, MetricQuery, Page, SortOrder};
use crate::store::{AlarmStore, MetricStore};
use crate::Result;

/// 内存存储（测试与无持久化部署）
#[derive(Clone, Default)]
pub struct MemoryStore {
    metrics: Arc<RwLock<Vec<StoredMetric>>>,
    alarms: Arc<RwLock<Vec<StoredAlarm>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn metric_count(&self) -> usize {
        self.metrics.read().await.len()
    }

    pub async fn alarm_count(&self) -> usize {
        self.alarms.read().await.len()
    }

    /// 全部告警（按写入顺序）
    pub async fn alarms(&self) -> Vec<StoredAlarm> {
        self.alarms.read().await.clone()
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn append_metric(&self, snapshot: &MetricSnapshot) -> Result<i64> {
        let mut metrics = self.metrics.write().await;
        let id = metrics.len() as i64 + 1;
        metrics.push(StoredMetric {
            id,
            snapshot: snapshot.clone(),
        });

        debug!(id, service = %snapshot.service_name, "Metric appended to memory store");
        Ok(id)
    }

    async fn latest_metric(&self) -> Result<Option<StoredMetric>> {
        Ok(self.metrics.read().await.last().cloned())
    }

    async fn get_metric(&self, id: i64) -> Result<Option<StoredMetric>> {
        let metrics = self.metrics.read().await;
        Ok(metrics.iter().find(|m| m.id == id).cloned())
    }

    async fn query_metrics(&self, query: &MetricQuery) -> Result<Page<StoredMetric>> {
        let metrics = self.metrics.read().await;
        let mut matched: Vec<StoredMetric> =
            metrics.iter().filter(|m| query.matches(m)).cloned().collect();

        matched.sort_by(|a, b| {
            (a.snapshot.captured_at, a.id).cmp(&(b.snapshot.captured_at, b.id))
        });
        if query.order == SortOrder::Desc {
            matched.reverse();
        }

        Ok(Page::slice(matched, query.page, query.size))
    }
}

#[async_trait]
impl AlarmStore for MemoryStore {
    async fn append_alarm(&self, alarm: &Alarm) -> Result<i64> {
        let mut alarms = self.alarms.write().await;
        let id = alarms.len() as i64 + 1;
        alarms.push(StoredAlarm {
            id,
            alarm: alarm.clone(),
        });

        debug!(id, dimension = %alarm.dimension, "Alarm appended to memory store");
        Ok(id)
    }

    async fn get_alarm(&self, id: i64) -> Result<Option<StoredAlarm>> {
        let alarms = self.alarms.read().await;
        Ok(alarms.iter().find(|a| a.id == id).cloned())
    }

    async fn query_alarms(&self, query: &AlarmQuery) -> Result<Page<StoredAlarm>> {
        let alarms = self.alarms.read().await;
        let mut matched: Vec<StoredAlarm> =
            alarms.iter().filter(|a| query.matches(a)).cloned().collect();

        matched.sort_by(|a, b| (a.alarm.raised_at, a.id).cmp(&(b.alarm.raised_at, b.id)));
        if query.order == SortOrder::Desc {
            matched.reverse();
        }

        Ok(Page::slice(matched, query.page, query.size))
    }

    async fn alarm_summary(&self) -> Result<AlarmSummary> {
        let alarms = self.alarms.read().await;
        let mut summary = AlarmSummary::default();

        for record in alarms.iter() {
            summary.total += 1;
            *summary.by_severity.entry(record.alarm.severity).or_insert(0) += 1;
        }

        Ok(summary)
    }
}
