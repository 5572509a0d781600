use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use flux_monitor_types::{
    Alarm, Dimension, MetricSnapshot, Severity, StoredAlarm, StoredMetric,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

use crate::query::{effective_size, AlarmQuery, AlarmSummary, MetricQuery, Page};
use crate::store::{AlarmStore, MetricStore};
use crate::{Result, StoreError};

const METRIC_COLUMNS: &str = "id, service_name, cpu, memory, requests, captured_at";
const ALARM_COLUMNS: &str =
    "id, service_name, dimension, metric_value, severity, raised_at, message";

/// SQLite 存储，时间以 UTC 毫秒整数保存
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// 连接数据库并建表
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // 内存库只存在于单个连接中，连接池必须固定为一个长期连接
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<std::time::Duration>)
                .max_lifetime(None::<std::time::Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;

        info!(database_url = %database_url, "SQLite store initialized");
        Ok(store)
    }

    /// 内存数据库
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                service_name TEXT NOT NULL,
                cpu REAL NOT NULL,
                memory REAL NOT NULL,
                requests REAL NOT NULL,
                captured_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alarms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                service_name TEXT NOT NULL,
                dimension TEXT NOT NULL,
                metric_value REAL NOT NULL,
                severity TEXT NOT NULL,
                raised_at INTEGER NOT NULL,
                message TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_metrics_time ON metrics(captured_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_alarms_time ON alarms(raised_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_alarms_severity ON alarms(severity, raised_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn to_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::InvalidRecord(format!("timestamp out of range: {}", ms)))
}

fn metric_from_row(row: &SqliteRow) -> Result<StoredMetric> {
    Ok(StoredMetric {
        id: row.try_get("id")?,
        snapshot: MetricSnapshot {
            service_name: row.try_get("service_name")?,
            cpu: row.try_get("cpu")?,
            memory: row.try_get("memory")?,
            requests: row.try_get("requests")?,
            captured_at: from_millis(row.try_get("captured_at")?)?,
        },
    })
}

fn alarm_from_row(row: &SqliteRow) -> Result<StoredAlarm> {
    let dimension: String = row.try_get("dimension")?;
    let severity: String = row.try_get("severity")?;

    Ok(StoredAlarm {
        id: row.try_get("id")?,
        alarm: Alarm {
            service_name: row.try_get("service_name")?,
            dimension: Dimension::from_str(&dimension)
                .map_err(|e| StoreError::InvalidRecord(e.to_string()))?,
            value: row.try_get("metric_value")?,
            severity: Severity::from_str(&severity)
                .map_err(|e| StoreError::InvalidRecord(e.to_string()))?,
            raised_at: from_millis(row.try_get("raised_at")?)?,
            message: row.try_get("message")?,
        },
    })
}

/// 追加 WHERE / AND 及列条件
fn push_clause(qb: &mut QueryBuilder<'_, Sqlite>, clauses: &mut usize, condition: &str) {
    qb.push(if *clauses == 0 { " WHERE " } else { " AND " });
    qb.push(condition);
    *clauses += 1;
}

fn push_alarm_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &AlarmQuery) {
    let mut clauses = 0;

    if let Some(severity) = query.severity {
        push_clause(qb, &mut clauses, "severity = ");
        qb.push_bind(severity.as_str().to_string());
    }

    if let Some(service_name) = &query.service_name {
        push_clause(qb, &mut clauses, "service_name = ");
        qb.push_bind(service_name.clone());
    }

    if let Some(dimension) = query.dimension {
        push_clause(qb, &mut clauses, "dimension = ");
        qb.push_bind(dimension.as_str().to_string());
    }

    if let Some(from) = &query.from {
        push_clause(qb, &mut clauses, "raised_at >= ");
        qb.push_bind(to_millis(from));
    }

    if let Some(to) = &query.to {
        push_clause(qb, &mut clauses, "raised_at <= ");
        qb.push_bind(to_millis(to));
    }
}

fn push_metric_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &MetricQuery) {
    let mut clauses = 0;

    if let Some(service_name) = &query.service_name {
        push_clause(qb, &mut clauses, "service_name = ");
        qb.push_bind(service_name.clone());
    }

    if let Some(from) = &query.from {
        push_clause(qb, &mut clauses, "captured_at >= ");
        qb.push_bind(to_millis(from));
    }

    if let Some(to) = &query.to {
        push_clause(qb, &mut clauses, "captured_at <= ");
        qb.push_bind(to_millis(to));
    }
}

fn push_paging(qb: &mut QueryBuilder<'_, Sqlite>, page: u32, size: u32) -> u32 {
    let size = effective_size(size);
    qb.push(" LIMIT ");
    qb.push_bind(size as i64);
    qb.push(" OFFSET ");
    qb.push_bind(page as i64 * size as i64);
    size
}

#[async_trait]
impl MetricStore for SqliteStore {
    async fn append_metric(&self, snapshot: &MetricSnapshot) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO metrics (service_name, cpu, memory, requests, captured_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.service_name)
        .bind(snapshot.cpu)
        .bind(snapshot.memory)
        .bind(snapshot.requests)
        .bind(to_millis(&snapshot.captured_at))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, service = %snapshot.service_name, "Metric written to SQLite");
        Ok(id)
    }

    async fn latest_metric(&self) -> Result<Option<StoredMetric>> {
        let sql = format!("SELECT {} FROM metrics ORDER BY id DESC LIMIT 1", METRIC_COLUMNS);
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

        row.as_ref().map(metric_from_row).transpose()
    }

    async fn get_metric(&self, id: i64) -> Result<Option<StoredMetric>> {
        let sql = format!("SELECT {} FROM metrics WHERE id = ?", METRIC_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(metric_from_row).transpose()
    }

    async fn query_metrics(&self, query: &MetricQuery) -> Result<Page<StoredMetric>> {
        let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM metrics");
        push_metric_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM metrics", METRIC_COLUMNS));
        push_metric_filters(&mut qb, query);
        qb.push(format!(
            " ORDER BY captured_at {order}, id {order}",
            order = query.order.as_sql()
        ));
        let size = push_paging(&mut qb, query.page, query.size);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(metric_from_row)
            .collect::<Result<Vec<_>>>()?;

        debug!(count = items.len(), total, "Queried metrics from SQLite");

        Ok(Page {
            items,
            page: query.page,
            size,
            total: total as u64,
        })
    }
}

#[async_trait]
impl AlarmStore for SqliteStore {
    async fn append_alarm(&self, alarm: &Alarm) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO alarms (service_name, dimension, metric_value, severity, raised_at, message)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&alarm.service_name)
        .bind(alarm.dimension.as_str())
        .bind(alarm.value)
        .bind(alarm.severity.as_str())
        .bind(to_millis(&alarm.raised_at))
        .bind(&alarm.message)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(
            id,
            service = %alarm.service_name,
            dimension = %alarm.dimension,
            severity = %alarm.severity,
            "Alarm written to SQLite"
        );
        Ok(id)
    }

    async fn get_alarm(&self, id: i64) -> Result<Option<StoredAlarm>> {
        let sql = format!("SELECT {} FROM alarms WHERE id = ?", ALARM_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(alarm_from_row).transpose()
    }

    async fn query_alarms(&self, query: &AlarmQuery) -> Result<Page<StoredAlarm>> {
        let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM alarms");
        push_alarm_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM alarms", ALARM_COLUMNS));
        push_alarm_filters(&mut qb, query);
        qb.push(format!(
            " ORDER BY raised_at {order}, id {order}",
            order = query.order.as_sql()
        ));
        let size = push_paging(&mut qb, query.page, query.size);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(alarm_from_row)
            .collect::<Result<Vec<_>>>()?;

        debug!(count = items.len(), total, "Queried alarms from SQLite");

        Ok(Page {
            items,
            page: query.page,
            size,
            total: total as u64,
        })
    }

    async fn alarm_summary(&self) -> Result<AlarmSummary> {
        let rows = sqlx::query("SELECT severity, COUNT(*) AS count FROM alarms GROUP BY severity")
            .fetch_all(&self.pool)
            .await?;

        let mut summary = AlarmSummary::default();
        for row in rows {
            let severity: String = row.try_get("severity")?;
            let count: i64 = row.try_get("count")?;
            let severity = Severity::from_str(&severity)
                .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;

            summary.total += count as u64;
            summary.by_severity.insert(severity, count as u64);
        }

        Ok(summary)
    }
}
