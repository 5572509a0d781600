use flux_monitor_config::ConfigError;
use flux_monitor_notify::NotifyError;
use flux_monitor_store::StoreError;

/// 指标源错误
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status code: {0}")]
    Status(u16),

    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("System probe failed: {0}")]
    Probe(String),
}

/// 监控服务错误
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Notifier error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Metric source error: {0}")]
    Source(#[from] SourceError),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
