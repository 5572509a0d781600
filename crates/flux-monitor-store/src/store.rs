use async_trait::async_trait;
use flux_monitor_types::{Alarm, MetricSnapshot, StoredAlarm, StoredMetric};

use crate::query::{AlarmQuery, AlarmSummary, MetricQuery, Page};
use crate::Result;

/// 指标存储（只追加）
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// 追加指标快照，返回自增 ID
    async fn append_metric(&self, snapshot: &MetricSnapshot) -> Result<i64>;

    /// 最近写入的快照（按写入顺序）
    async fn latest_metric(&self) -> Result<Option<StoredMetric>>;

    async fn get_metric(&self, id: i64) -> Result<Option<StoredMetric>>;

    /// 按服务与时间范围分页查询
    async fn query_metrics(&self, query: &MetricQuery) -> Result<Page<StoredMetric>>;
}

/// 告警存储（只追加）
#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// 追加告警，返回自增 ID
    async fn append_alarm(&self, alarm: &Alarm) -> Result<i64>;

    async fn get_alarm(&self, id: i64) -> Result<Option<StoredAlarm>>;

    /// 按级别、服务、时间范围分页查询
    async fn query_alarms(&self, query: &AlarmQuery) -> Result<Page<StoredAlarm>>;

    /// 告警总数及各级别数量
    async fn alarm_summary(&self) -> Result<AlarmSummary>;
}
