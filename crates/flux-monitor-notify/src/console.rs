use async_trait::async_trait;
use flux_monitor_types::Alarm;

use crate::notifier::{Notifier, NotifyError};

/// 控制台通知器
#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }

    pub fn format_line(alarm: &Alarm) -> String {
        format!(
            "[ALARM] {} | Service: {} | Metric: {} | Value: {} | Message: {} | Time: {}",
            alarm.severity,
            alarm.service_name,
            alarm.dimension,
            alarm.value,
            alarm.message,
            alarm.raised_at.to_rfc3339()
        )
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, alarm: &Alarm) -> Result<(), NotifyError> {
        println!("{}", Self::format_line(alarm));
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
