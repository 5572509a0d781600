pub mod alarm;
pub mod metric;
pub mod threshold;

pub use alarm::{Alarm, Severity, StoredAlarm};
pub use metric::{Dimension, MetricSnapshot, StoredMetric};
pub use threshold::{Threshold, Thresholds};

/// 解析枚举字符串失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
