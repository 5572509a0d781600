use serde::{Deserialize, Serialize};

use crate::alarm::Severity;
use crate::metric::Dimension;

/// 单个维度的告警阈值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub warning: f64,
    pub critical: f64,
}

impl Threshold {
    pub fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }

    /// 分级：`value >= critical` 为 CRITICAL，`warning <= value < critical` 为 WARNING
    pub fn classify(&self, value: f64) -> Option<Severity> {
        if value >= self.critical {
            Some(Severity::Critical)
        } else if value >= self.warning {
            Some(Severity::Warning)
        } else {
            None
        }
    }
}

/// 全部维度的阈值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub cpu: Threshold,
    pub memory: Threshold,
    pub requests: Threshold,
}

impl Thresholds {
    pub fn get(&self, dimension: Dimension) -> &Threshold {
        match dimension {
            Dimension::Cpu => &self.cpu,
            Dimension::Memory => &self.memory,
            Dimension::Requests => &self.requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        let threshold = Threshold::new(70.0, 90.0);

        assert_eq!(threshold.classify(0.0), None);
        assert_eq!(threshold.classify(69.99), None);
        assert_eq!(threshold.classify(70.0), Some(Severity::Warning));
        assert_eq!(threshold.classify(89.99), Some(Severity::Warning));
        assert_eq!(threshold.classify(90.0), Some(Severity::Critical));
        assert_eq!(threshold.classify(1e9), Some(Severity::Critical));
    }

    #[test]
    fn test_classify_sweep() {
        let threshold = Threshold::new(1000.0, 2000.0);

        for v in (0..3000).step_by(7) {
            let v = v as f64;
            let expected = if v >= 2000.0 {
                Some(Severity::Critical)
            } else if v >= 1000.0 {
                Some(Severity::Warning)
            } else {
                None
            };
            assert_eq!(threshold.classify(v), expected, "value {}", v);
        }
    }

    #[test]
    fn test_equal_warning_and_critical_is_always_critical() {
        let threshold = Threshold::new(50.0, 50.0);
        assert_eq!(threshold.classify(50.0), Some(Severity::Critical));
        assert_eq!(threshold.classify(49.0), None);
    }
}
