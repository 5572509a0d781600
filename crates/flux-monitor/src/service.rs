use flux_monitor_config::{ConfigError, MonitorConfig, NotifierKind, SourceKind};
use flux_monitor_notify::{ConsoleNotifier, EmailNotifier, NotificationManager, SmtpConfig};
use flux_monitor_store::{AlarmStore, MetricStore, SqliteStore};
use std::sync::Arc;
use tracing::{info, warn};

use crate::collector::MetricCollector;
use crate::cooldown::CooldownGate;
use crate::error::Result;
use crate::evaluator::ThresholdEvaluator;
use crate::metrics::PipelineMetrics;
use crate::scheduler::{spawn_periodic, TaskHandle};
use crate::source::{HttpMetricSource, MetricSource, SystemMetricSource};

/// 告警管道：采集器与评估器两个独立的周期任务
pub struct MonitorService {
    config: MonitorConfig,
    collector: Arc<MetricCollector>,
    evaluator: Arc<ThresholdEvaluator>,
    alarm_store: Arc<dyn AlarmStore>,
    metrics: Arc<PipelineMetrics>,
}

/// 运行中的周期任务
pub struct MonitorHandles {
    collector: TaskHandle,
    evaluator: TaskHandle,
}

impl MonitorHandles {
    pub async fn shutdown(self) {
        self.collector.shutdown().await;
        self.evaluator.shutdown().await;
    }
}

impl MonitorService {
    /// 按配置装配存储、指标源与通知渠道
    pub async fn from_config(config: MonitorConfig) -> Result<Self> {
        info!(service = %config.monitoring.service_name, "Initializing monitor service");

        let store = Arc::new(SqliteStore::connect(&config.storage.database_url).await?);
        let source = build_source(&config)?;
        let notifications = build_notifications(&config)?;

        Self::new(config, source, store.clone(), store, notifications)
    }

    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn MetricSource>,
        metric_store: Arc<dyn MetricStore>,
        alarm_store: Arc<dyn AlarmStore>,
        notifications: NotificationManager,
    ) -> Result<Self> {
        let metrics = Arc::new(PipelineMetrics::new()?);

        let collector = Arc::new(MetricCollector::new(
            config.monitoring.service_name.clone(),
            source,
            metric_store.clone(),
            metrics.clone(),
        ));

        let evaluator = Arc::new(ThresholdEvaluator::new(
            config.alarm.thresholds(),
            metric_store,
            alarm_store.clone(),
            Arc::new(notifications),
            CooldownGate::new(config.alarm.cooldown_scope, config.alarm.cooldown()?),
            metrics.clone(),
        ));

        Ok(Self {
            config,
            collector,
            evaluator,
            alarm_store,
            metrics,
        })
    }

    /// 启动时立即采集一次，然后启动两个周期任务
    pub async fn start(&self) -> MonitorHandles {
        if let Err(e) = self.collector.collect_now().await {
            warn!(error = %e, "Initial metric collection failed");
        }

        let collector = spawn_periodic(self.collector.clone(), self.config.monitoring.collect_interval());
        let evaluator = spawn_periodic(self.evaluator.clone(), self.config.monitoring.check_interval());

        info!(
            service = %self.config.monitoring.service_name,
            collect_interval_ms = self.config.monitoring.metrics_collect_interval_ms,
            check_interval_ms = self.config.monitoring.alarm_check_interval_ms,
            "Monitor service started"
        );

        MonitorHandles {
            collector,
            evaluator,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn collector(&self) -> &MetricCollector {
        &self.collector
    }

    pub fn evaluator(&self) -> &ThresholdEvaluator {
        &self.evaluator
    }

    pub fn alarm_store(&self) -> Arc<dyn AlarmStore> {
        self.alarm_store.clone()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }
}

fn build_source(config: &MonitorConfig) -> Result<Arc<dyn MetricSource>> {
    let source = &config.monitoring.source;

    match source.kind {
        SourceKind::Http => {
            let mut http = HttpMetricSource::new(source.url.clone(), source.timeout())?;
            if let Some(username) = &source.username {
                http = http.with_basic_auth(username.clone(), source.password.clone());
            }
            info!(url = %source.url, "Using HTTP metric source");
            Ok(Arc::new(http))
        }
        SourceKind::System => {
            info!("Using local system metric source");
            Ok(Arc::new(SystemMetricSource::new()))
        }
    }
}

fn build_notifications(config: &MonitorConfig) -> Result<NotificationManager> {
    let mut manager = NotificationManager::new();

    for kind in &config.alarm.notifiers {
        match kind {
            NotifierKind::Console => manager.add_notifier(Arc::new(ConsoleNotifier::new())),
            NotifierKind::Email => {
                let email = config.alarm.email.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("email notifier requires [alarm.email]".to_string())
                })?;
                let smtp = SmtpConfig {
                    smtp_host: email.smtp_host.clone(),
                    smtp_port: email.smtp_port,
                    username: email.username.clone(),
                    password: email.password.clone(),
                    from: email.from.clone(),
                };
                manager.add_notifier(Arc::new(EmailNotifier::smtp(&smtp, email.to.clone())?));
            }
        }
    }

    if manager.notifier_count() == 0 {
        warn!("No notifiers configured, alarms will only be persisted");
    }

    Ok(manager)
}
