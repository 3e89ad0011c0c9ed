//! Planner configuration.
//!
//! Tunables for the search bounds and the ranking stage, loadable from TOML or
//! YAML so limits can change without code changes. A missing file means
//! defaults:
//!
//! ```
//! use pitwall::config::PlannerConfig;
//!
//! let config = PlannerConfig::load("pitwall.toml").unwrap_or_default();
//! assert_eq!(config.effective_limits().max_total_stints, 20);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "pitwall.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Fixed three-plan catalogs are the push / semi lift / full lift layout and
/// allow more repetitions per plan; general catalogs take any number of plans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogMode {
    #[default]
    General,
    FixedThree,
}

/// Whether a strategy must cover the required time or may fall short of it
/// by up to the tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvertimePolicy {
    #[default]
    CoverageRequired,
    AllowUndershoot,
}

impl OvertimePolicy {
    pub fn accepts(self, over_time: f64, tolerance: f64) -> bool {
        match self {
            Self::CoverageRequired => over_time >= 0.0 && over_time <= tolerance,
            Self::AllowUndershoot => over_time.abs() <= tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// One row per plan-count signature.
    #[default]
    Signature,
    /// One row per signature and swap placement.
    SwapVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub max_per_plan: u32,
    pub max_total_stints: u32,
    pub max_overtime_minutes: f64,
    pub overtime_policy: OvertimePolicy,
}

impl SearchLimits {
    pub fn general() -> Self {
        Self {
            max_per_plan: 8,
            max_total_stints: 20,
            max_overtime_minutes: 30.0,
            overtime_policy: OvertimePolicy::CoverageRequired,
        }
    }

    pub fn fixed_three() -> Self {
        Self {
            max_per_plan: 10,
            ..Self::general()
        }
    }

    pub fn for_mode(mode: CatalogMode) -> Self {
        match mode {
            CatalogMode::General => Self::general(),
            CatalogMode::FixedThree => Self::fixed_three(),
        }
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::general()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub catalog_mode: CatalogMode,
    /// Overrides the per-mode defaults when set.
    pub limits: Option<SearchLimits>,
    pub dedup: DedupMode,
    /// Rows kept after ranking. `None` uses 100 (general) or 50 (fixed three).
    pub result_cap: Option<usize>,
    pub max_swap_variants: usize,
    pub include_auto_adjusted: bool,
    /// Worker threads for the parallel enumeration path; 0 keeps the search on
    /// the calling thread.
    pub parallel_workers: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            catalog_mode: CatalogMode::General,
            limits: None,
            dedup: DedupMode::Signature,
            result_cap: None,
            max_swap_variants: 4,
            include_auto_adjusted: true,
            parallel_workers: 0,
        }
    }
}

impl PlannerConfig {
    pub fn for_mode(mode: CatalogMode) -> Self {
        Self {
            catalog_mode: mode,
            ..Self::default()
        }
    }

    pub fn effective_limits(&self) -> SearchLimits {
        self.limits
            .unwrap_or_else(|| SearchLimits::for_mode(self.catalog_mode))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validated()
    }

    pub fn effective_result_cap(&self) -> usize {
        self.result_cap.unwrap_or(match self.catalog_mode {
            CatalogMode::General => 100,
            CatalogMode::FixedThree => 50,
        })
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let limits = self.effective_limits();
        if limits.max_total_stints == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_total_stints must be at least 1".to_string(),
            ));
        }
        if !(limits.max_overtime_minutes >= 0.0) {
            return Err(ConfigError::Invalid(
                "limits.max_overtime_minutes must be non-negative".to_string(),
            ));
        }
        if self.max_swap_variants == 0 {
            return Err(ConfigError::Invalid(
                "max_swap_variants must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_only_named_fields() {
        let config = PlannerConfig::from_toml_str(
            r#"
            catalog_mode = "fixed_three"
            dedup = "swap_variant"

            [limits]
            max_per_plan = 10
            overtime_policy = "allow_undershoot"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.catalog_mode, CatalogMode::FixedThree);
        assert_eq!(config.dedup, DedupMode::SwapVariant);
        let limits = config.effective_limits();
        assert_eq!(limits.max_per_plan, 10);
        assert_eq!(limits.max_total_stints, 20);
        assert_eq!(limits.overtime_policy, OvertimePolicy::AllowUndershoot);
        assert_eq!(config.effective_result_cap(), 50);
    }

    #[test]
    fn mode_picks_per_plan_cap_when_limits_are_absent() {
        let config = PlannerConfig::from_toml_str("catalog_mode = \"fixed_three\"\n")
            .expect("config should parse");
        assert_eq!(config.effective_limits().max_per_plan, 10);
        assert_eq!(PlannerConfig::default().effective_limits().max_per_plan, 8);
    }

    #[test]
    fn yaml_is_accepted() {
        let config = PlannerConfig::from_yaml_str("result_cap: 10\nmax_swap_variants: 2\n")
            .expect("config should parse");
        assert_eq!(config.effective_result_cap(), 10);
        assert_eq!(config.max_swap_variants, 2);
    }

    #[test]
    fn zero_stint_cap_is_rejected() {
        let err = PlannerConfig::from_toml_str("[limits]\nmax_total_stints = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = PlannerConfig::load("definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn overtime_policy_bounds() {
        assert!(OvertimePolicy::CoverageRequired.accepts(0.0, 30.0));
        assert!(OvertimePolicy::CoverageRequired.accepts(30.0, 30.0));
        assert!(!OvertimePolicy::CoverageRequired.accepts(-1.0, 30.0));
        assert!(!OvertimePolicy::CoverageRequired.accepts(30.5, 30.0));
        assert!(OvertimePolicy::AllowUndershoot.accepts(-12.0, 30.0));
        assert!(!OvertimePolicy::AllowUndershoot.accepts(-31.0, 30.0));
    }
}
