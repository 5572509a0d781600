use chrono::{DateTime, Duration, Utc};
use flux_monitor_config::CooldownScope;
use flux_monitor_types::Dimension;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// 冷却键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CooldownKey {
    /// 所有服务与维度共享
    Global,
    Dimension {
        service_name: String,
        dimension: Dimension,
    },
}

/// 冷却闸门：同一键下两次告警间隔不小于冷却时间
pub struct CooldownGate {
    scope: CooldownScope,
    window: Duration,
    last_emission: RwLock<HashMap<CooldownKey, DateTime<Utc>>>,
}

impl CooldownGate {
    pub fn new(scope: CooldownScope, window: Duration) -> Self {
        Self {
            scope,
            window,
            last_emission: RwLock::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> CooldownScope {
        self.scope
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn key_for(&self, service_name: &str, dimension: Dimension) -> CooldownKey {
        match self.scope {
            CooldownScope::Global => CooldownKey::Global,
            CooldownScope::PerDimension => CooldownKey::Dimension {
                service_name: service_name.to_string(),
                dimension,
            },
        }
    }

    /// `now < last + window` 时抑制；未记录过的键永不抑制，窗口溢出时始终抑制
    pub async fn is_suppressed(&self, key: &CooldownKey, now: DateTime<Utc>) -> bool {
        let last_emission = self.last_emission.read().await;
        match last_emission.get(key) {
            Some(last) => match last.checked_add_signed(self.window) {
                Some(until) => now < until,
                None => true,
            },
            None => false,
        }
    }

    pub async fn record_emission(&self, key: CooldownKey, now: DateTime<Utc>) {
        debug!(key = ?key, at = %now, "Cooldown window started");
        self.last_emission.write().await.insert(key, now);
    }

    pub async fn last_emission(&self, key: &CooldownKey) -> Option<DateTime<Utc>> {
        self.last_emission.read().await.get(key).copied()
    }
}
