//! Analysis configuration.
//!
//! Resolved once by the embedding application and passed into the engine;
//! nothing in the engine reads the environment.

use serde::{Deserialize, Serialize};

use crate::models::{ValidationError, ValidationResult};

/// Default relative change (5%) below which a trend is `stable`.
pub const DEFAULT_TREND_NOISE_THRESHOLD: f64 = 0.05;

/// How panels sharing a test date contribute to a trend series.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateDatePolicy {
    /// Every panel is a separate point; same-date points keep input order.
    #[default]
    KeepAll,
    /// Only the most recently collected panel for a date is kept.
    KeepLatestPerDate,
}

/// Tunables for trend aggregation and comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Relative change the latest value must exceed to count as rising/falling
    pub trend_noise_threshold: f64,
    pub duplicate_dates: DuplicateDatePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trend_noise_threshold: DEFAULT_TREND_NOISE_THRESHOLD,
            duplicate_dates: DuplicateDatePolicy::KeepAll,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration. Missing keys take defaults.
    pub fn from_json(json: &str) -> ValidationResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ValidationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        let t = self.trend_noise_threshold;
        if !t.is_finite() || t < 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "trend_noise_threshold must be a non-negative number, got {t}"
            )));
        }
        Ok(())
    }
}
