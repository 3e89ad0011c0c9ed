//! A planning scenario as a user writes it: race constants, the plan catalog
//! and optional overrides for the required time and swap count. Scenario
//! files are JSON or YAML; request bodies and presets share the same shape.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::data::constants::RaceConstants;
use crate::data::plan::{resolve_plans, PlanInput, StintPlan};
use crate::error::{PlannerError, Result};
use crate::optimizer::auto_adjust::PlanRoles;
use crate::optimizer::StrategyRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceScenario {
    #[serde(default)]
    pub constants: RaceConstants,
    pub plans: Vec<PlanInput>,
    /// Skips the estimate from race constants when set.
    #[serde(default, alias = "requiredTimeMinutes", skip_serializing_if = "Option::is_none")]
    pub required_minutes: Option<f64>,
    /// Overrides `constants.mandatory_driver_swaps` when set.
    #[serde(default, alias = "mandatorySwaps", skip_serializing_if = "Option::is_none")]
    pub mandatory_swaps: Option<u32>,
}

impl RaceScenario {
    pub fn new(constants: RaceConstants, plans: &[StintPlan]) -> Self {
        Self {
            constants,
            plans: plans.iter().map(PlanInput::from).collect(),
            required_minutes: None,
            mandatory_swaps: None,
        }
    }

    /// Reads YAML for `.yaml`/`.yml`, JSON otherwise.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let scenario = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };
        Ok(scenario)
    }

    pub fn effective_swaps(&self) -> u32 {
        self.mandatory_swaps
            .unwrap_or(self.constants.mandatory_driver_swaps)
    }

    /// Constants with the swap override applied.
    pub fn effective_constants(&self) -> RaceConstants {
        RaceConstants {
            mandatory_driver_swaps: self.effective_swaps(),
            ..self.constants
        }
    }

    /// Explicit requirement, or the race clock minus estimated pit losses
    /// using the reference plan's stint length.
    pub fn required_minutes(&self, plans: &[StintPlan]) -> Result<f64> {
        if let Some(minutes) = self.required_minutes {
            return Ok(minutes);
        }
        let reference = reference_plan(plans).ok_or_else(|| {
            PlannerError::InvalidPlanSet("plan catalog is empty".to_string())
        })?;
        self.effective_constants()
            .estimate_required_stint_minutes(reference.stint_duration_minutes)
            .ok_or_else(|| {
                PlannerError::InvalidPlanSet(format!(
                    "plan '{}' has a non-positive stint duration",
                    reference.id
                ))
            })
    }

    pub fn to_request(&self) -> Result<StrategyRequest> {
        let plans = resolve_plans(&self.plans)?;
        let required_minutes = self.required_minutes(&plans)?;
        Ok(StrategyRequest {
            plans,
            required_minutes,
            mandatory_swaps: self.effective_swaps(),
            constants: Some(self.effective_constants()),
        })
    }
}

/// Balanced plan of a three-style catalog, otherwise the median stint length.
pub fn reference_plan(plans: &[StintPlan]) -> Option<&StintPlan> {
    if let Some(roles) = PlanRoles::from_catalog(plans) {
        return plans.get(roles.balanced);
    }
    let mut sorted: Vec<&StintPlan> = plans.iter().collect();
    sorted.sort_by_key(|plan| plan.stint_duration_minutes);
    sorted.get(sorted.len() / 2).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::plan::default_catalog;

    #[test]
    fn required_time_is_estimated_from_the_balanced_plan() {
        let scenario = RaceScenario::new(RaceConstants::default(), &default_catalog());
        let request = scenario.to_request().expect("scenario resolves");
        // 480 min race, 6 stints of 80: 2 regular pits of 52 s and 3 swaps of 210 s
        let expected = 480.0 - 2.0 * 52.0 / 60.0 - 3.0 * 3.5;
        assert!((request.required_minutes - expected).abs() < 1e-9);
        assert_eq!(request.mandatory_swaps, 3);
    }

    #[test]
    fn overrides_win_over_constants() {
        let mut scenario = RaceScenario::new(RaceConstants::default(), &default_catalog());
        scenario.required_minutes = Some(300.0);
        scenario.mandatory_swaps = Some(1);
        let request = scenario.to_request().expect("scenario resolves");
        assert_eq!(request.required_minutes, 300.0);
        assert_eq!(request.mandatory_swaps, 1);
        assert_eq!(request.constants.map(|c| c.mandatory_driver_swaps), Some(1));
    }

    #[test]
    fn yaml_scenario_parses_camel_case_fields() {
        let scenario: RaceScenario = serde_yaml::from_str(
            r#"
constants:
  raceTimeHours: 6
  pitTimeSeconds: 50
  longPitTimeMinutes: 3
  mandatoryDriverSwaps: 2
plans:
  - name: Push
    duration: 70
  - name: Save
    pace:
      pace_seconds: 100
      fuel_per_lap: 2.5
      fuel_carried: 100
"#,
        )
        .expect("scenario parses");
        let request = scenario.to_request().expect("scenario resolves");
        assert_eq!(request.plans[0].id, "plan1");
        // 40 laps * 100 s = 66.7 -> 67 min
        assert_eq!(request.plans[1].stint_duration_minutes, 67);
        assert_eq!(request.mandatory_swaps, 2);
    }

    #[test]
    fn reference_plan_for_small_catalogs_is_the_median() {
        let plans = vec![StintPlan::new("b", "B", 90), StintPlan::new("a", "A", 60)];
        assert_eq!(reference_plan(&plans).map(|p| p.id.as_str()), Some("b"));
        assert!(reference_plan(&[]).is_none());
    }
}
