//! Stint plans: the catalog entries the engine combines.
//!
//! A plan is either given directly as a stint length in minutes or derived from
//! lap pace and fuel: laps per tank are rounded down, stint minutes rounded up.

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// One driving-style template. Owned by the caller; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StintPlan {
    pub id: String,
    pub name: String,
    #[serde(alias = "duration", alias = "stintDurationMinutes")]
    pub stint_duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StintPlan {
    pub fn new(id: impl Into<String>, name: impl Into<String>, stint_duration_minutes: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stint_duration_minutes,
            description: None,
        }
    }
}

/// Lap pace and fuel figures for a plan. Fuel units are whatever the caller
/// uses; only the ratio matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceProfile {
    pub pace_seconds: f64,
    pub fuel_per_lap: f64,
    pub fuel_carried: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StintDerivation {
    pub laps_per_stint: u32,
    pub stint_duration_minutes: u32,
}

/// Derive stint length from pace and fuel. Returns zero laps and minutes when
/// any figure is missing or non-positive.
pub fn derive_stint(pace: &PaceProfile) -> StintDerivation {
    if !(pace.pace_seconds > 0.0 && pace.fuel_per_lap > 0.0 && pace.fuel_carried > 0.0) {
        return StintDerivation {
            laps_per_stint: 0,
            stint_duration_minutes: 0,
        };
    }
    let laps = (pace.fuel_carried / pace.fuel_per_lap).floor();
    let minutes = (laps * pace.pace_seconds / 60.0).ceil();
    StintDerivation {
        laps_per_stint: laps as u32,
        stint_duration_minutes: minutes as u32,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

pub fn validate_plan(pace: &PaceProfile) -> PlanValidation {
    let mut errors = Vec::new();
    if !(pace.pace_seconds > 0.0) {
        errors.push("pace must be greater than 0 seconds".to_string());
    }
    if !(pace.fuel_per_lap > 0.0) {
        errors.push("fuel per lap must be greater than 0".to_string());
    }
    if !(pace.fuel_carried > 0.0) {
        errors.push("fuel carried must be greater than 0".to_string());
    }
    if pace.fuel_per_lap > pace.fuel_carried {
        errors.push("fuel per lap cannot be greater than fuel carried".to_string());
    }
    PlanValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Plan as it arrives from a scenario file, request body or preset: either a
/// stint length or the pace figures to derive one from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(
        default,
        alias = "duration",
        alias = "stintDurationMinutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub stint_duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<PaceProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PlanInput {
    /// Resolve to a [StintPlan]. An explicit duration wins over pace figures.
    /// `index` names plans that carry no id.
    pub fn resolve(&self, index: usize) -> Result<StintPlan, PlannerError> {
        let id = self
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("plan{}", index + 1));

        let minutes = match (self.stint_duration_minutes, self.pace.as_ref()) {
            (Some(minutes), _) => minutes,
            (None, Some(pace)) => {
                let check = validate_plan(pace);
                if !check.is_valid {
                    return Err(PlannerError::InvalidPlanSet(format!(
                        "plan '{}': {}",
                        self.name,
                        check.errors.join("; ")
                    )));
                }
                derive_stint(pace).stint_duration_minutes
            }
            (None, None) => {
                return Err(PlannerError::InvalidPlanSet(format!(
                    "plan '{}' has neither a stint duration nor pace figures",
                    self.name
                )))
            }
        };

        Ok(StintPlan {
            id,
            name: self.name.clone(),
            stint_duration_minutes: minutes,
            description: self.description.clone(),
        })
    }
}

impl From<&StintPlan> for PlanInput {
    fn from(plan: &StintPlan) -> Self {
        Self {
            id: Some(plan.id.clone()),
            name: plan.name.clone(),
            stint_duration_minutes: Some(plan.stint_duration_minutes),
            pace: None,
            description: plan.description.clone(),
        }
    }
}

/// Resolve every input, failing on the first unusable plan.
pub fn resolve_plans(inputs: &[PlanInput]) -> Result<Vec<StintPlan>, PlannerError> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| input.resolve(index))
        .collect()
}

/// The classic three-plan catalog (push, semi lift, full lift).
pub fn default_catalog() -> Vec<StintPlan> {
    vec![
        StintPlan {
            description: Some("Aggressive driving style".to_string()),
            ..StintPlan::new("push", "Push", 75)
        },
        StintPlan {
            description: Some("Balanced driving style".to_string()),
            ..StintPlan::new("semi", "Semi Lift", 80)
        },
        StintPlan {
            description: Some("Fuel-saving driving style".to_string()),
            ..StintPlan::new("full", "Full Lift", 90)
        },
    ]
}
