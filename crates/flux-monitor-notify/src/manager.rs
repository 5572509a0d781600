use flux_monitor_types::Alarm;
use std::sync::Arc;
use tracing::{error, info};

use crate::notifier::Notifier;

/// 一次扇出的投递结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl FanOutReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 通知管理器，按注册顺序向所有渠道投递
#[derive(Default, Clone)]
pub struct NotificationManager {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_notifier(&mut self, notifier: Arc<dyn Notifier>) {
        info!(channel = %notifier.name(), "Registered notifier");
        self.notifiers.push(notifier);
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.notifiers.iter().map(|n| n.name().to_string()).collect()
    }

    /// 向每个渠道投递告警，单个渠道失败只记录日志
    pub async fn notify(&self, alarm: &Alarm) -> FanOutReport {
        let mut report = FanOutReport::default();

        for notifier in &self.notifiers {
            if !notifier.is_enabled() {
                continue;
            }

            match notifier.notify(alarm).await {
                Ok(()) => report.delivered.push(notifier.name().to_string()),
                Err(e) => {
                    error!(
                        channel = %notifier.name(),
                        dimension = %alarm.dimension,
                        severity = %alarm.severity,
                        error = %e,
                        "Failed to deliver alarm notification"
                    );
                    report
                        .failed
                        .push((notifier.name().to_string(), e.to_string()));
                }
            }
        }

        report
    }
}
