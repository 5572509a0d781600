pub mod global;
pub mod loader;

pub use global::{
    AlarmConfig, CooldownScope, EmailConfig, LoggingConfig, MonitorConfig, MonitoringConfig,
    NotifierKind, SourceConfig, SourceKind, StorageConfig, MAX_COOLDOWN_SECONDS,
};
pub use loader::ConfigLoader;

/// 配置错误（启动阶段致命）
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
