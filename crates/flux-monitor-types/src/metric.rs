use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// 监控维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dimension {
    Cpu,
    Memory,
    Requests,
}

impl Dimension {
    /// 固定的评估顺序：CPU -> MEMORY -> REQUESTS
    pub const ALL: [Dimension; 3] = [Dimension::Cpu, Dimension::Memory, Dimension::Requests];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Cpu => "CPU",
            Dimension::Memory => "MEMORY",
            Dimension::Requests => "REQUESTS",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CPU" => Ok(Dimension::Cpu),
            "MEMORY" => Ok(Dimension::Memory),
            "REQUESTS" => Ok(Dimension::Requests),
            _ => Err(ParseEnumError {
                kind: "dimension",
                value: s.to_string(),
            }),
        }
    }
}

/// 指标快照（创建后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub service_name: String,
    pub cpu: f64,
    pub memory: f64,
    pub requests: f64,
    pub captured_at: DateTime<Utc>,
}

impl MetricSnapshot {
    pub fn new(service_name: impl Into<String>, cpu: f64, memory: f64, requests: f64) -> Self {
        Self {
            service_name: service_name.into(),
            cpu,
            memory,
            requests,
            captured_at: Utc::now(),
        }
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// 按维度取值
    pub fn value(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Cpu => self.cpu,
            Dimension::Memory => self.memory,
            Dimension::Requests => self.requests,
        }
    }
}

/// 已持久化的指标记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMetric {
    pub id: i64,
    #[serde(flatten)]
    pub snapshot: MetricSnapshot,
}
