pub mod memory;
pub mod query;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use query::{AlarmQuery, AlarmSummary, MetricQuery, Page, SortOrder};
pub use sqlite::SqliteStore;
pub use store::{AlarmStore, MetricStore};

/// 存储错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
