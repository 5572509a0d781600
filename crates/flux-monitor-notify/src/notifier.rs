use async_trait::async_trait;
use flux_monitor_types::Alarm;

/// 通知错误
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Message build error: {0}")]
    Message(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// 通知渠道接口
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alarm: &Alarm) -> Result<(), NotifyError>;

    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool {
        true
    }
}
