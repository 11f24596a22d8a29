use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calculations::conflicts::Severity;

/// Upper bounds (inclusive) of the `low` and `medium` severity buckets, in hours over capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub low_max: f64,
    pub medium_max: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            low_max: 2.0,
            medium_max: 4.0,
        }
    }
}

impl SeverityThresholds {
    pub fn classify(&self, over_hours: f64) -> Severity {
        if over_hours <= self.low_max {
            Severity::Low
        } else if over_hours <= self.medium_max {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Mean utilization (percent) above which a leveling suggestion is emitted.
    pub leveling_threshold: f64,
    /// Mean utilization (percent) below which an idle resource is offered for reallocation.
    pub reallocation_threshold: f64,
    /// A hire suggestion needs strictly more high-severity conflicts than this.
    pub hire_high_conflict_threshold: usize,
    /// Positive cost; reported as a negative impact.
    pub hire_cost: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            leveling_threshold: 90.0,
            reallocation_threshold: 50.0,
            hire_high_conflict_threshold: 5,
            hire_cost: 50_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub severity: SeverityThresholds,
    pub advisor: AdvisorConfig,
    /// Longest range the conflict detector will scan. Zero (the default) disables the limit.
    pub max_range_days: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            severity: SeverityThresholds::default(),
            advisor: AdvisorConfig::default(),
            max_range_days: 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl AnalysisConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let severity = &self.severity;
        if !severity.low_max.is_finite() || !severity.medium_max.is_finite() {
            return Err(ConfigError::Invalid(
                "severity thresholds must be finite".into(),
            ));
        }
        if severity.low_max < 0.0 || severity.low_max >= severity.medium_max {
            return Err(ConfigError::Invalid(format!(
                "severity thresholds must satisfy 0 <= low_max < medium_max (got {} and {})",
                severity.low_max, severity.medium_max
            )));
        }
        let advisor = &self.advisor;
        if !advisor.leveling_threshold.is_finite() || !advisor.reallocation_threshold.is_finite()
        {
            return Err(ConfigError::Invalid(
                "advisor thresholds must be finite".into(),
            ));
        }
        if !advisor.hire_cost.is_finite() || advisor.hire_cost < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "hire_cost must be non-negative (got {})",
                advisor.hire_cost
            )));
        }
        if self.max_range_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "max_range_days must be non-negative (got {})",
                self.max_range_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_put_boundaries_in_lower_bucket() {
        let t = SeverityThresholds::default();
        assert_eq!(t.classify(0.5), Severity::Low);
        assert_eq!(t.classify(2.0), Severity::Low);
        assert_eq!(t.classify(2.01), Severity::Medium);
        assert_eq!(t.classify(4.0), Severity::Medium);
        assert_eq!(t.classify(4.01), Severity::High);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "advisor": { "hire_cost": 12000.0 } }"#).unwrap();
        assert_eq!(config.advisor.hire_cost, 12000.0);
        assert_eq!(config.advisor.leveling_threshold, 90.0);
        assert_eq!(config.severity, SeverityThresholds::default());
        assert_eq!(config.max_range_days, 0);
    }

    #[test]
    fn inverted_thresholds_are_invalid() {
        let mut config = AnalysisConfig::default();
        config.severity.low_max = 5.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
