use chrono::{DateTime, Utc};
use flux_monitor_types::{Dimension, Severity, StoredAlarm, StoredMetric};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单页最大条数
pub const MAX_PAGE_SIZE: u32 = 1000;

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// 按时间排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// 告警查询
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmQuery {
    pub severity: Option<Severity>,

    pub service_name: Option<String>,

    pub dimension: Option<Dimension>,

    /// 起始时间（含）
    pub from: Option<DateTime<Utc>>,

    /// 结束时间（含）
    pub to: Option<DateTime<Utc>>,

    /// 页码，从 0 开始
    pub page: u32,

    pub size: u32,

    pub order: SortOrder,
}

impl Default for AlarmQuery {
    fn default() -> Self {
        Self {
            severity: None,
            service_name: None,
            dimension: None,
            from: None,
            to: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            order: SortOrder::default(),
        }
    }
}

impl AlarmQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_service(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn with_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn matches(&self, record: &StoredAlarm) -> bool {
        let alarm = &record.alarm;
        self.severity.map_or(true, |s| alarm.severity == s)
            && self
                .service_name
                .as_ref()
                .map_or(true, |s| &alarm.service_name == s)
            && self.dimension.map_or(true, |d| alarm.dimension == d)
            && self.from.map_or(true, |from| alarm.raised_at >= from)
            && self.to.map_or(true, |to| alarm.raised_at <= to)
    }
}

/// 指标查询
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricQuery {
    pub service_name: Option<String>,

    pub from: Option<DateTime<Utc>>,

    pub to: Option<DateTime<Utc>>,

    pub page: u32,

    pub size: u32,

    pub order: SortOrder,
}

impl Default for MetricQuery {
    fn default() -> Self {
        Self {
            service_name: None,
            from: None,
            to: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            order: SortOrder::default(),
        }
    }
}

impl MetricQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn with_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn matches(&self, record: &StoredMetric) -> bool {
        let snapshot = &record.snapshot;
        self.service_name
            .as_ref()
            .map_or(true, |s| &snapshot.service_name == s)
            && self.from.map_or(true, |from| snapshot.captured_at >= from)
            && self.to.map_or(true, |to| snapshot.captured_at <= to)
    }
}

/// 实际生效的分页大小
pub(crate) fn effective_size(size: u32) -> u32 {
    size.clamp(1, MAX_PAGE_SIZE)
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    /// 从已排序的完整结果中切出一页
    pub(crate) fn slice(sorted: Vec<T>, page: u32, size: u32) -> Self {
        let size = effective_size(size);
        let total = sorted.len() as u64;
        let start = (page as usize).saturating_mul(size as usize);
        let items = sorted
            .into_iter()
            .skip(start)
            .take(size as usize)
            .collect();

        Self {
            items,
            page,
            size,
            total,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(self.size as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 告警统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSummary {
    pub total: u64,
    pub by_severity: BTreeMap<Severity, u64>,
}

impl AlarmSummary {
    pub fn count(&self, severity: Severity) -> u64 {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_query_builder() {
        let now = Utc::now();
        let query = AlarmQuery::new()
            .with_severity(Severity::Critical)
            .with_service("order-service")
            .with_range(now - chrono::Duration::hours(1), now)
            .with_page(2, 50)
            .with_order(SortOrder::Asc);

        assert_eq!(query.severity, Some(Severity::Critical));
        assert_eq!(query.service_name.as_deref(), Some("order-service"));
        assert_eq!(query.page, 2);
        assert_eq!(query.size, 50);
        assert_eq!(query.order, SortOrder::Asc);
    }

    #[test]
    fn test_page_slice() {
        let page = Page::slice((0..45).collect::<Vec<_>>(), 2, 20);

        assert_eq!(page.items, (40..45).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages(), 3);

        let beyond = Page::slice((0..5).collect::<Vec<_>>(), 3, 20);
        assert!(beyond.is_empty());
        assert_eq!(beyond.total, 5);
    }

    #[test]
    fn test_page_size_clamped() {
        let page = Page::slice((0..5).collect::<Vec<_>>(), 0, 0);
        assert_eq!(page.size, 1);
        assert_eq!(page.items, vec![0]);
    }
}
