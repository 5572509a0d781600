use chrono::Duration;
use flux_monitor_types::{Threshold, Thresholds};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;

use crate::ConfigError;

/// 冷却时间上限（30 天）
pub const MAX_COOLDOWN_SECONDS: u64 = 30 * 24 * 60 * 60;

/// 监控服务全局配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub monitoring: MonitoringConfig,

    pub alarm: AlarmConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 采集配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfig {
    /// 被监控服务名称
    pub service_name: String,

    /// 采集间隔（毫秒）
    #[serde(default = "default_collect_interval_ms")]
    pub metrics_collect_interval_ms: u64,

    /// 告警检查间隔（毫秒）
    #[serde(default = "default_check_interval_ms")]
    pub alarm_check_interval_ms: u64,

    #[serde(default)]
    pub source: SourceConfig,
}

impl MonitoringConfig {
    pub fn collect_interval(&self) -> StdDuration {
        StdDuration::from_millis(self.metrics_collect_interval_ms)
    }

    pub fn check_interval(&self) -> StdDuration {
        StdDuration::from_millis(self.alarm_check_interval_ms)
    }
}

/// 指标源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// HTTP 指标端点
    Http,
    /// 本机探针
    System,
}

/// 指标源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,

    #[serde(default = "default_source_url")]
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_source_timeout_ms")]
    pub timeout_ms: u64,
}

impl SourceConfig {
    pub fn timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.timeout_ms)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            url: default_source_url(),
            username: None,
            password: None,
            timeout_ms: default_source_timeout_ms(),
        }
    }
}

/// 冷却键粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CooldownScope {
    /// 全局共享一个冷却时间戳
    #[default]
    Global,
    /// 按 (服务, 维度) 独立冷却
    PerDimension,
}

/// 通知渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    Console,
    Email,
}

/// 告警配置，六个阈值与冷却时间均为必填
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmConfig {
    pub cpu_threshold_warning: f64,
    pub cpu_threshold_critical: f64,

    pub memory_threshold_warning: f64,
    pub memory_threshold_critical: f64,

    pub requests_threshold_warning: f64,
    pub requests_threshold_critical: f64,

    /// 告警冷却（秒）
    pub cooldown_seconds: u64,

    #[serde(default)]
    pub cooldown_scope: CooldownScope,

    /// 有序的通知渠道列表
    #[serde(default = "default_notifiers")]
    pub notifiers: Vec<NotifierKind>,

    #[serde(default)]
    pub email: Option<EmailConfig>,
}

impl AlarmConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            cpu: Threshold::new(self.cpu_threshold_warning, self.cpu_threshold_critical),
            memory: Threshold::new(self.memory_threshold_warning, self.memory_threshold_critical),
            requests: Threshold::new(
                self.requests_threshold_warning,
                self.requests_threshold_critical,
            ),
        }
    }

    pub fn cooldown(&self) -> crate::Result<Duration> {
        i64::try_from(self.cooldown_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "alarm.cooldownSeconds out of range: {}",
                    self.cooldown_seconds
                ))
            })
    }
}

/// 邮件通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    pub from: String,

    /// 固定收件人
    pub to: String,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_collect_interval_ms() -> u64 {
    5000
}

fn default_check_interval_ms() -> u64 {
    10000
}

fn default_source_kind() -> SourceKind {
    SourceKind::Http
}

fn default_source_url() -> String {
    "http://localhost:8080/metrics".to_string()
}

fn default_source_timeout_ms() -> u64 {
    3000
}

fn default_notifiers() -> Vec<NotifierKind> {
    vec![NotifierKind::Console]
}

fn default_smtp_port() -> u16 {
    587
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_monitor_types::Dimension;

    const MINIMAL: &str = r#"
[monitoring]
serviceName = "order-service"

[alarm]
cpuThresholdWarning = 70
cpuThresholdCritical = 90
memoryThresholdWarning = 70
memoryThresholdCritical = 90
requestsThresholdWarning = 1000
requestsThresholdCritical = 2000
cooldownSeconds = 10
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config: MonitorConfig = toml::from_str(MINIMAL).unwrap();

        assert_eq!(config.monitoring.service_name, "order-service");
        assert_eq!(config.monitoring.metrics_collect_interval_ms, 5000);
        assert_eq!(config.monitoring.alarm_check_interval_ms, 10000);
        assert_eq!(config.monitoring.source.kind, SourceKind::Http);
        assert_eq!(config.monitoring.source.timeout_ms, 3000);
        assert_eq!(config.alarm.cooldown_scope, CooldownScope::Global);
        assert_eq!(config.alarm.notifiers, vec![NotifierKind::Console]);
        assert_eq!(config.storage.database_url, "sqlite::memory:");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_thresholds_mapping() {
        let config: MonitorConfig = toml::from_str(MINIMAL).unwrap();
        let thresholds = config.alarm.thresholds();

        assert_eq!(thresholds.get(Dimension::Cpu), &Threshold::new(70.0, 90.0));
        assert_eq!(thresholds.get(Dimension::Memory), &Threshold::new(70.0, 90.0));
        assert_eq!(
            thresholds.get(Dimension::Requests),
            &Threshold::new(1000.0, 2000.0)
        );
        assert_eq!(config.alarm.cooldown().unwrap(), Duration::seconds(10));
    }

    #[test]
    fn test_missing_threshold_fails() {
        let broken = MINIMAL.replace("memoryThresholdCritical = 90\n", "");
        let result: Result<MonitorConfig, _> = toml::from_str(&broken);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_notifier_fails() {
        let broken = format!("{}notifiers = [\"console\", \"sms\"]\n", MINIMAL);
        let result: Result<MonitorConfig, _> = toml::from_str(&broken);
        assert!(result.is_err());
    }

    #[test]
    fn test_per_dimension_scope() {
        let content = format!("{}cooldownScope = \"perDimension\"\n", MINIMAL);
        let config: MonitorConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.alarm.cooldown_scope, CooldownScope::PerDimension);
    }
}
