use anyhow::Result;
use flux_monitor::{init_logging, MonitorService};
use flux_monitor_config::ConfigLoader;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/monitor.toml".to_string());

    // 配置不完整时拒绝启动
    let config = ConfigLoader::new(&config_path).load()?;

    init_logging(&config.logging)?;

    // 日志初始化之后再输出配置摘要
    info!(
        config = %config_path,
        service = %config.monitoring.service_name,
        collect_interval_ms = config.monitoring.metrics_collect_interval_ms,
        notifiers = ?config.alarm.notifiers,
        "Starting flux-monitor"
    );

    let service = MonitorService::from_config(config).await?;
    let handles = service.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    handles.shutdown().await;

    match service.alarm_store().alarm_summary().await {
        Ok(summary) => info!(total = summary.total, by_severity = ?summary.by_severity, "Alarm summary"),
        Err(e) => warn!(error = %e, "Failed to load alarm summary"),
    }

    match service.metrics().export() {
        Ok(exported) => info!("Pipeline metrics:\n{}", exported),
        Err(e) => warn!(error = %e, "Failed to export pipeline metrics"),
    }

    Ok(())
}
