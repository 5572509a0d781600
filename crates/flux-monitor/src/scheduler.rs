use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::Result;

/// 周期任务
#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn run_tick(&self) -> Result<()>;
}

/// 周期任务句柄
pub struct TaskHandle {
    name: String,
    shutdown_tx: watch::Sender<bool>,
    join_handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    /// 等待当前 tick 结束后停止
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join_handle.await;
        info!(task = %self.name, "Periodic task stopped");
    }

    pub fn abort(self) {
        self.join_handle.abort();
    }
}

/// 按固定间隔运行任务，首次在一个周期后触发。
///
/// 同一任务的 tick 串行执行，超时的 tick 会推迟下一次触发；
/// 每个 tick 在独立的 tokio 任务中运行，错误与 panic 只记录日志。
pub fn spawn_periodic(task: Arc<dyn PeriodicTask>, period: Duration) -> TaskHandle {
    let name = task.name().to_string();
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task_name = name.clone();
    let join_handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(task = %task_name, period_ms = period.as_millis() as u64, "Periodic task started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    run_isolated(&task_name, task.clone()).await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    TaskHandle {
        name,
        shutdown_tx,
        join_handle,
    }
}

async fn run_isolated(name: &str, task: Arc<dyn PeriodicTask>) {
    let started = Instant::now();

    match tokio::spawn(async move { task.run_tick().await }).await {
        Ok(Ok(())) => {
            debug!(task = %name, elapsed_ms = started.elapsed().as_millis() as u64, "Tick completed");
        }
        Ok(Err(e)) => {
            warn!(task = %name, error = %e, "Tick failed");
        }
        Err(e) => {
            error!(task = %name, error = %e, "Tick aborted");
        }
    }
}
