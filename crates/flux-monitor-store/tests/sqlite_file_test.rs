use chrono::Utc;
use flux_monitor_store::{AlarmQuery, AlarmStore, MetricStore, SqliteStore};
use flux_monitor_types::{Alarm, Dimension, MetricSnapshot, Severity};
use tempfile::TempDir;

#[tokio::test]
async fn test_records_survive_reconnect() {
    let temp_dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("monitor.db").display()
    );

    {
        let store = SqliteStore::connect(&url).await.unwrap();
        store
            .append_metric(&MetricSnapshot::new("order-service", 75.0, 40.0, 900.0))
            .await
            .unwrap();
        store
            .append_alarm(&Alarm::new(
                "order-service",
                Dimension::Cpu,
                75.0,
                Severity::Warning,
                Utc::now(),
            ))
            .await
            .unwrap();
        store.close().await;
    }

    // 重新连接后数据仍在
    let store = SqliteStore::connect(&url).await.unwrap();

    let latest = store.latest_metric().await.unwrap().unwrap();
    assert_eq!(latest.snapshot.service_name, "order-service");
    assert_eq!(latest.snapshot.cpu, 75.0);

    let alarms = store.query_alarms(&AlarmQuery::new()).await.unwrap();
    assert_eq!(alarms.total, 1);
    assert_eq!(
        alarms.items[0].alarm.message,
        "WARNING level reached for CPU: 75.00"
    );
}

#[tokio::test]
async fn test_concurrent_appends_are_serialized() {
    let temp_dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("concurrent.db").display()
    );
    let store = SqliteStore::connect(&url).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .append_metric(&MetricSnapshot::new("svc", i as f64, 0.0, 0.0))
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 8);
}
