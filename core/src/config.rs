//! Tunable constants for the dive log auditor.
//!
//! The defaults are coaching heuristics, not physiological limits: the 52/48
//! travel split, the speed thresholds and the 120 m depth reference have no
//! cited source and are exposed here so they can be retuned or probed in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Thresholds driving derivation, flags and suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditThresholds {
    /// Share of travel time attributed to the descent when neither leg is known
    pub descent_split_ratio: f64,

    /// Descent speed (m/s) above which `descent_too_fast` is flagged
    pub max_descent_mps: f64,

    /// Ascent speed (m/s) above which `ascent_too_fast` is flagged
    pub max_ascent_mps: f64,

    /// Ascent speed (m/s) above which the pacing tip is suggested
    pub ascent_advice_mps: f64,

    /// Total dive time (seconds) above which `very_long_total_time` is flagged
    pub long_total_time_sec: i32,

    /// Narcosis severity at or above which `narcosis_concern` is flagged
    pub narcosis_concern_level: i32,

    /// Recovery quality at or below which `poor_recovery` is flagged
    pub poor_recovery_level: i32,
}

/// Risk score contributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    /// Depth (m) at which the depth contribution reaches its cap
    pub depth_reference_m: f64,

    /// Cap of the linear depth contribution
    pub depth_max_points: f64,

    pub ascent_too_fast: f64,
    pub descent_too_fast: f64,
    pub lung_squeeze: f64,
    pub ear_squeeze: f64,
    pub narcosis: f64,
}

/// Main auditor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    pub thresholds: AuditThresholds,
    pub risk: RiskWeights,
    /// Number of prior logs compared against for trend flags
    pub history_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            thresholds: AuditThresholds {
                descent_split_ratio: 0.52,
                max_descent_mps: 1.4,
                max_ascent_mps: 1.0,
                ascent_advice_mps: 0.9,
                long_total_time_sec: 480,
                narcosis_concern_level: 3,
                poor_recovery_level: 2,
            },
            risk: RiskWeights {
                depth_reference_m: 120.0,
                depth_max_points: 40.0,
                ascent_too_fast: 15.0,
                descent_too_fast: 10.0,
                lung_squeeze: 25.0,
                ear_squeeze: 10.0,
                narcosis: 10.0,
            },
            history_limit: 10,
        }
    }
}

impl AuditConfig {
    /// Load configuration from `DIVELOG_AUDIT_*` environment variables with
    /// fallback to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the result fails validation
    pub fn from_environment() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed or the result fails validation
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let t = &mut config.thresholds;
        override_from(&lookup, "DIVELOG_AUDIT_DESCENT_SPLIT", &mut t.descent_split_ratio)?;
        override_from(&lookup, "DIVELOG_AUDIT_MAX_DESCENT_MPS", &mut t.max_descent_mps)?;
        override_from(&lookup, "DIVELOG_AUDIT_MAX_ASCENT_MPS", &mut t.max_ascent_mps)?;
        override_from(&lookup, "DIVELOG_AUDIT_ASCENT_ADVICE_MPS", &mut t.ascent_advice_mps)?;
        override_from(&lookup, "DIVELOG_AUDIT_LONG_DIVE_SEC", &mut t.long_total_time_sec)?;
        override_from(&lookup, "DIVELOG_AUDIT_DEPTH_REFERENCE_M", &mut config.risk.depth_reference_m)?;
        override_from(&lookup, "DIVELOG_AUDIT_HISTORY_LIMIT", &mut config.history_limit)?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(t.descent_split_ratio > 0.0 && t.descent_split_ratio < 1.0) {
            return Err(ConfigError::ValidationFailed(
                "descent_split_ratio must be between 0 and 1 (exclusive)".into(),
            ));
        }

        let speeds = [t.max_descent_mps, t.max_ascent_mps, t.ascent_advice_mps];
        if !speeds.iter().all(|v| positive_finite(*v)) {
            return Err(ConfigError::ValidationFailed(
                "speed thresholds must be finite and > 0".into(),
            ));
        }

        if !positive_finite(self.risk.depth_reference_m) {
            return Err(ConfigError::ValidationFailed(
                "depth_reference_m must be finite and > 0".into(),
            ));
        }

        let r = &self.risk;
        let weights = [
            r.depth_max_points,
            r.ascent_too_fast,
            r.descent_too_fast,
            r.lung_squeeze,
            r.ear_squeeze,
            r.narcosis,
        ];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "risk weights must be finite and >= 0".into(),
            ));
        }

        if self.history_limit == 0 {
            return Err(ConfigError::ValidationFailed(
                "history_limit must be > 0".into(),
            ));
        }

        Ok(())
    }
}

fn positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn override_from<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AuditConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_limit, 10);
        assert!((config.thresholds.descent_split_ratio - 0.52).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = AuditConfig::from_lookup(|key| match key {
            "DIVELOG_AUDIT_DESCENT_SPLIT" => Some("0.5".to_string()),
            "DIVELOG_AUDIT_HISTORY_LIMIT" => Some(" 20 ".to_string()),
            _ => None,
        })
        .unwrap();

        assert!((config.thresholds.descent_split_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.history_limit, 20);
        assert!((config.thresholds.max_ascent_mps - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = AuditConfig::from_lookup(|key| match key {
            "DIVELOG_AUDIT_MAX_ASCENT_MPS" => Some("fast".to_string()),
            _ => None,
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "DIVELOG_AUDIT_MAX_ASCENT_MPS"
        ));
    }

    #[test]
    fn test_validate_bounds() {
        let mut config = AuditConfig::default();
        config.thresholds.descent_split_ratio = 1.0;
        assert!(config.validate().is_err());

        let mut config = AuditConfig::default();
        config.history_limit = 0;
        assert!(config.validate().is_err());

        let mut config = AuditConfig::default();
        config.risk.lung_squeeze = -1.0;
        assert!(config.validate().is_err());

        let result = AuditConfig::from_lookup(|key| match key {
            "DIVELOG_AUDIT_DEPTH_REFERENCE_M" => Some("0".to_string()),
            _ => None,
        });
        assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_from_lookup_rejects_non_finite() {
        for (key, raw) in [
            ("DIVELOG_AUDIT_MAX_ASCENT_MPS", "NaN"),
            ("DIVELOG_AUDIT_MAX_DESCENT_MPS", "inf"),
            ("DIVELOG_AUDIT_ASCENT_ADVICE_MPS", "NaN"),
            ("DIVELOG_AUDIT_DEPTH_REFERENCE_M", "inf"),
            ("DIVELOG_AUDIT_DESCENT_SPLIT", "NaN"),
        ] {
            let result = AuditConfig::from_lookup(|k| (k == key).then(|| raw.to_string()));
            assert!(
                matches!(result, Err(ConfigError::ValidationFailed(_))),
                "{key}={raw} accepted"
            );
        }
    }
}
