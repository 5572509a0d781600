use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::metric::Dimension;
use crate::ParseEnumError;

/// 告警级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 2] = [Severity::Warning, Severity::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WARNING" => Ok(Severity::Warning),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(ParseEnumError {
                kind: "severity",
                value: s.to_string(),
            }),
        }
    }
}

/// 告警实例
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub service_name: String,
    pub dimension: Dimension,
    pub value: f64,
    pub severity: Severity,
    pub raised_at: DateTime<Utc>,
    pub message: String,
}

impl Alarm {
    /// 构造告警，消息格式固定为 `<级别> level reached for <维度>: <值保留两位小数>`
    pub fn new(
        service_name: impl Into<String>,
        dimension: Dimension,
        value: f64,
        severity: Severity,
        raised_at: DateTime<Utc>,
    ) -> Self {
        let message = format!("{} level reached for {}: {:.2}", severity, dimension, value);
        Self {
            service_name: service_name.into(),
            dimension,
            value,
            severity,
            raised_at,
            message,
        }
    }
}

/// 已持久化的告警记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAlarm {
    pub id: i64,
    #[serde(flatten)]
    pub alarm: Alarm,
}
