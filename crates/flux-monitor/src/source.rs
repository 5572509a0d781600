use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::System;
use tracing::debug;

use crate::error::SourceError;

/// 一次采样的原始读数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub cpu: f64,
    pub memory: f64,
    pub requests: f64,
}

/// 指标源接口
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch(&self) -> Result<MetricSample, SourceError>;

    fn name(&self) -> &str;
}

/// HTTP 指标端点，返回 `{"cpu": .., "memory": .., "requests": ..}`
pub struct HttpMetricSource {
    url: String,
    client: reqwest::Client,
    credentials: Option<(String, Option<String>)>,
}

impl HttpMetricSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: url.into(),
            client,
            credentials: None,
        })
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some((username.into(), password));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    async fn fetch(&self) -> Result<MetricSample, SourceError> {
        let mut request = self.client.get(&self.url);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let sample: MetricSample =
            serde_json::from_str(&body).map_err(|e| SourceError::Payload(e.to_string()))?;

        debug!(url = %self.url, cpu = sample.cpu, memory = sample.memory, requests = sample.requests, "Fetched metrics");
        Ok(sample)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// 本机探针：CPU 与内存取百分比，requests 取进程数
pub struct SystemMetricSource {
    system: Arc<Mutex<System>>,
}

impl SystemMetricSource {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();

        Self {
            system: Arc::new(Mutex::new(system)),
        }
    }
}

impl Default for SystemMetricSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricSource for SystemMetricSource {
    async fn fetch(&self) -> Result<MetricSample, SourceError> {
        let system = self.system.clone();

        tokio::task::spawn_blocking(move || {
            let mut system = system
                .lock()
                .map_err(|_| SourceError::Probe("probe state poisoned".to_string()))?;

            system.refresh_cpu();
            system.refresh_memory();
            system.refresh_processes();

            let total = system.total_memory();
            let memory = if total == 0 {
                0.0
            } else {
                system.used_memory() as f64 / total as f64 * 100.0
            };

            Ok(MetricSample {
                cpu: system.global_cpu_info().cpu_usage() as f64,
                memory,
                requests: system.processes().len() as f64,
            })
        })
        .await
        .map_err(|e| SourceError::Probe(e.to_string()))?
    }

    fn name(&self) -> &str {
        "system"
    }
}
