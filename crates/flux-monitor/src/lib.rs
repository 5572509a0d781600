pub mod collector;
pub mod cooldown;
pub mod error;
pub mod evaluator;
pub mod logging;
pub mod metrics;
pub mod scheduler;
pub mod service;
pub mod source;

pub use collector::MetricCollector;
pub use cooldown::{CooldownGate, CooldownKey};
pub use error::{MonitorError, Result, SourceError};
pub use evaluator::ThresholdEvaluator;
pub use logging::init_logging;
pub use metrics::PipelineMetrics;
pub use scheduler::{spawn_periodic, PeriodicTask, TaskHandle};
pub use service::{MonitorHandles, MonitorService};
pub use source::{HttpMetricSource, MetricSample, MetricSource, SystemMetricSource};
