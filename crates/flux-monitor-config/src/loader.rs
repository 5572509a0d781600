use std::path::{Path, PathBuf};
use tracing::debug;

use crate::global::{MonitorConfig, NotifierKind, MAX_COOLDOWN_SECONDS};
use crate::{ConfigError, Result};

/// 可由环境变量覆盖的敏感配置项
pub const ENV_SOURCE_USERNAME: &str = "FLUX_MONITOR_SOURCE_USERNAME";
pub const ENV_SOURCE_PASSWORD: &str = "FLUX_MONITOR_SOURCE_PASSWORD";
pub const ENV_SMTP_PASSWORD: &str = "FLUX_MONITOR_SMTP_PASSWORD";
pub const ENV_DATABASE_URL: &str = "FLUX_MONITOR_DATABASE_URL";

/// 配置加载器
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// 加载、覆盖并校验配置；任何错误都应阻止服务启动
    pub fn load(&self) -> Result<MonitorConfig> {
        let content = std::fs::read_to_string(&self.config_path).map_err(|e| ConfigError::Io {
            path: self.config_path.display().to_string(),
            source: e,
        })?;

        let mut config = Self::parse(&content)?;
        Self::apply_overrides(&mut config, |key| std::env::var(key).ok());
        Self::validate(&config)?;

        debug!(
            path = %self.config_path.display(),
            service = %config.monitoring.service_name,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// 解析 TOML 文本
    pub fn parse(content: &str) -> Result<MonitorConfig> {
        Ok(toml::from_str(content)?)
    }

    /// 用环境变量覆盖凭据与数据库地址
    pub fn apply_overrides<F>(config: &mut MonitorConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup(ENV_SOURCE_USERNAME) {
            debug!("Source username overridden from environment");
            config.monitoring.source.username = Some(username);
        }

        if let Some(password) = lookup(ENV_SOURCE_PASSWORD) {
            debug!("Source password overridden from environment");
            config.monitoring.source.password = Some(password);
        }

        if let Some(password) = lookup(ENV_SMTP_PASSWORD) {
            if let Some(email) = config.alarm.email.as_mut() {
                debug!("SMTP password overridden from environment");
                email.password = password;
            }
        }

        if let Some(url) = lookup(ENV_DATABASE_URL) {
            debug!("Database url overridden from environment");
            config.storage.database_url = url;
        }
    }

    /// 校验配置
    pub fn validate(config: &MonitorConfig) -> Result<()> {
        if config.monitoring.service_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "monitoring.serviceName must not be empty".to_string(),
            ));
        }

        if config.monitoring.metrics_collect_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "monitoring.metricsCollectIntervalMs must be greater than 0".to_string(),
            ));
        }

        if config.monitoring.alarm_check_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "monitoring.alarmCheckIntervalMs must be greater than 0".to_string(),
            ));
        }

        if config.monitoring.source.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "monitoring.source.timeoutMs must be greater than 0".to_string(),
            ));
        }

        let alarm = &config.alarm;
        let pairs = [
            ("cpu", alarm.cpu_threshold_warning, alarm.cpu_threshold_critical),
            (
                "memory",
                alarm.memory_threshold_warning,
                alarm.memory_threshold_critical,
            ),
            (
                "requests",
                alarm.requests_threshold_warning,
                alarm.requests_threshold_critical,
            ),
        ];

        for (name, warning, critical) in pairs {
            if !warning.is_finite() || !critical.is_finite() || warning < 0.0 || critical < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "alarm.{}Threshold values must be finite and non-negative",
                    name
                )));
            }

            if warning > critical {
                return Err(ConfigError::Invalid(format!(
                    "alarm.{}ThresholdWarning ({}) cannot be greater than alarm.{}ThresholdCritical ({})",
                    name, warning, name, critical
                )));
            }
        }

        if alarm.cooldown_seconds > MAX_COOLDOWN_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "alarm.cooldownSeconds ({}) cannot exceed {}",
                alarm.cooldown_seconds, MAX_COOLDOWN_SECONDS
            )));
        }

        if alarm.notifiers.contains(&NotifierKind::Email) && alarm.email.is_none() {
            return Err(ConfigError::Invalid(
                "alarm.notifiers contains \"email\" but [alarm.email] is missing".to_string(),
            ));
        }

        Ok(())
    }
}
