use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flux_monitor_notify::NotificationManager;
use flux_monitor_store::{AlarmStore, MetricStore};
use flux_monitor_types::{Alarm, Dimension, Thresholds};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::cooldown::CooldownGate;
use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::scheduler::PeriodicTask;

/// 阈值评估器
pub struct ThresholdEvaluator {
    thresholds: Thresholds,
    metric_store: Arc<dyn MetricStore>,
    alarm_store: Arc<dyn AlarmStore>,
    notifications: Arc<NotificationManager>,
    gate: CooldownGate,
    metrics: Arc<PipelineMetrics>,
    // 闸门的读-改-写在一次评估内原子完成
    pass_lock: Mutex<()>,
}

impl ThresholdEvaluator {
    pub fn new(
        thresholds: Thresholds,
        metric_store: Arc<dyn MetricStore>,
        alarm_store: Arc<dyn AlarmStore>,
        notifications: Arc<NotificationManager>,
        gate: CooldownGate,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            thresholds,
            metric_store,
            alarm_store,
            notifications,
            gate,
            metrics,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    pub async fn check_for_alarms(&self) -> Result<Vec<Alarm>> {
        self.check_for_alarms_at(Utc::now()).await
    }

    /// 对最新快照做一次评估，返回本次发出的告警
    pub async fn check_for_alarms_at(&self, now: DateTime<Utc>) -> Result<Vec<Alarm>> {
        let _pass = self.pass_lock.lock().await;

        let latest = match self.metric_store.latest_metric().await? {
            Some(latest) => latest,
            None => {
                debug!("No metrics stored yet, skipping alarm check");
                return Ok(Vec::new());
            }
        };
        let snapshot = &latest.snapshot;

        let mut emitted = Vec::new();
        for dimension in Dimension::ALL {
            let value = snapshot.value(dimension);
            let severity = match self.thresholds.get(dimension).classify(value) {
                Some(severity) => severity,
                None => continue,
            };

            let key = self.gate.key_for(&snapshot.service_name, dimension);
            if self.gate.is_suppressed(&key, now).await {
                self.metrics.record_suppressed(dimension);
                debug!(
                    service = %snapshot.service_name,
                    dimension = %dimension,
                    severity = %severity,
                    value,
                    "Alarm suppressed by cooldown"
                );
                continue;
            }

            let alarm = Alarm::new(snapshot.service_name.clone(), dimension, value, severity, now);

            let report = self.notifications.notify(&alarm).await;
            for (channel, _) in &report.failed {
                self.metrics.record_notification_failure(channel);
            }

            if let Err(e) = self.alarm_store.append_alarm(&alarm).await {
                self.metrics.record_store_failure("alarms");
                error!(
                    service = %alarm.service_name,
                    dimension = %dimension,
                    error = %e,
                    "Failed to persist alarm"
                );
            }

            self.gate.record_emission(key, now).await;
            self.metrics.record_alarm(dimension, severity);

            info!(
                service = %alarm.service_name,
                dimension = %dimension,
                severity = %severity,
                value,
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "Alarm raised"
            );
            emitted.push(alarm);
        }

        Ok(emitted)
    }
}

#[async_trait]
impl PeriodicTask for ThresholdEvaluator {
    fn name(&self) -> &str {
        "threshold-evaluator"
    }

    async fn run_tick(&self) -> Result<()> {
        self.check_for_alarms().await.map(|_| ())
    }
}
