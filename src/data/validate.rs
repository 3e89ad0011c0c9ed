use std::fmt;

use serde::Serialize;

use crate::config::CatalogMode;
use crate::data::constants::{regulation_driver_swaps, RaceConstants};
use crate::data::plan::{validate_plan, PlanInput, StintPlan};
use crate::optimizer::enumerator::{duplicate_id, FIXED_CATALOG_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Warning)
    }

    /// Flatten to the `{is_valid, errors}` shape callers show to users.
    pub fn to_result(&self) -> ValidationResult {
        ValidationResult {
            is_valid: !self.has_errors(),
            errors: self.errors().map(|diag| diag.message.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Pre-flight check of planner inputs. Reports instead of failing.
///
/// `mandatory_swaps` is signed so a negative count coming from user input can
/// be reported rather than rejected at the type level.
pub fn validate_parameters(
    plans: &[StintPlan],
    required_minutes: f64,
    mandatory_swaps: i64,
    mode: CatalogMode,
) -> ValidationResult {
    parameter_report(plans, required_minutes, mandatory_swaps, mode).to_result()
}

pub fn parameter_report(
    plans: &[StintPlan],
    required_minutes: f64,
    mandatory_swaps: i64,
    mode: CatalogMode,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if mode == CatalogMode::FixedThree && plans.len() != FIXED_CATALOG_SIZE {
        report.push(
            ValidationSeverity::Error,
            "plans",
            format!(
                "Exactly {FIXED_CATALOG_SIZE} stint plans are required, got {}",
                plans.len()
            ),
        );
    }
    if plans.is_empty() {
        report.push(
            ValidationSeverity::Error,
            "plans",
            "At least one stint plan is required",
        );
    }
    for plan in plans.iter().filter(|plan| plan.stint_duration_minutes == 0) {
        report.push(
            ValidationSeverity::Error,
            format!("plans.{}", plan.id),
            "Stint duration must be greater than 0",
        );
    }
    if let Some(id) = duplicate_id(plans) {
        report.push(
            ValidationSeverity::Error,
            format!("plans.{id}"),
            "Plan ids must be unique",
        );
    }
    if !(required_minutes > 0.0) || !required_minutes.is_finite() {
        report.push(
            ValidationSeverity::Error,
            "required_minutes",
            "Required time must be greater than 0",
        );
    }
    if mandatory_swaps < 0 {
        report.push(
            ValidationSeverity::Error,
            "mandatory_swaps",
            "Mandatory driver swaps cannot be negative",
        );
    }

    let longest = plans
        .iter()
        .map(|plan| plan.stint_duration_minutes)
        .max()
        .unwrap_or(0);
    if longest > 0 && required_minutes > 0.0 && mandatory_swaps > 0 {
        // the fewest stints that cover the requirement give the fewest pits
        let min_stints = (required_minutes / f64::from(longest)).ceil() as i64;
        let max_pits = (min_stints - 1).max(0);
        if max_pits < mandatory_swaps {
            report.push(
                ValidationSeverity::Error,
                "mandatory_swaps",
                format!(
                    "Cannot fit {mandatory_swaps} mandatory swaps with only {max_pits} pit stops available"
                ),
            );
        }
    }

    report
}

/// Scenario-level check: the parameter check plus per-plan pace figures and a
/// warning when the swap count is below what the race length usually calls
/// for.
pub fn validate_scenario(
    inputs: &[PlanInput],
    plans: &[StintPlan],
    constants: &RaceConstants,
    required_minutes: f64,
    mode: CatalogMode,
) -> ValidationReport {
    let mut report = parameter_report(
        plans,
        required_minutes,
        i64::from(constants.mandatory_driver_swaps),
        mode,
    );

    for (index, input) in inputs.iter().enumerate() {
        let Some(pace) = input.pace.as_ref() else {
            continue;
        };
        let context = format!("plans[{index}].pace");
        for error in validate_plan(pace).errors {
            report.push(ValidationSeverity::Error, context.clone(), error);
        }
    }

    if constants.race_time_hours <= 0.0 {
        report.push(
            ValidationSeverity::Error,
            "constants.race_time_hours",
            "Race time must be greater than 0",
        );
    }
    if constants.pit_time_seconds < 0.0 || constants.swap_pit_minutes() < 0.0 {
        report.push(
            ValidationSeverity::Error,
            "constants",
            "Pit stop times cannot be negative",
        );
    }

    let typical = regulation_driver_swaps(constants.race_time_hours, u32::MAX);
    if constants.mandatory_driver_swaps < typical {
        report.push(
            ValidationSeverity::Warning,
            "constants.mandatory_driver_swaps",
            format!(
                "{} swaps is below the {typical} usually required for a {}h race",
                constants.mandatory_driver_swaps, constants.race_time_hours
            ),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::plan::{default_catalog, PaceProfile};

    #[test]
    fn default_catalog_passes() {
        let result = validate_parameters(&default_catalog(), 467.0, 3, CatalogMode::FixedThree);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn every_problem_is_reported_at_once() {
        let plans = vec![StintPlan::new("a", "A", 60)];
        let result = validate_parameters(&plans, 0.0, -1, CatalogMode::FixedThree);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3, "{:?}", result.errors);
    }

    #[test]
    fn infeasible_swap_count_is_reported() {
        // 375 / 90 -> 5 stints at best, so only 4 pits
        let result = validate_parameters(&default_catalog(), 375.0, 5, CatalogMode::General);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("4 pit stops"), "{:?}", result.errors);
    }

    #[test]
    fn duplicate_plan_ids_are_reported() {
        let plans = vec![StintPlan::new("a", "A", 60), StintPlan::new("a", "B", 70)];
        let result = validate_parameters(&plans, 300.0, 0, CatalogMode::General);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("unique"), "{:?}", result.errors);
    }

    #[test]
    fn general_mode_accepts_any_catalog_size() {
        let plans = vec![StintPlan::new("a", "A", 60), StintPlan::new("b", "B", 70)];
        assert!(validate_parameters(&plans, 300.0, 2, CatalogMode::General).is_valid);
    }

    #[test]
    fn scenario_check_reports_pace_errors_and_low_swaps() {
        let inputs = vec![PlanInput {
            id: None,
            name: "Broken".to_string(),
            stint_duration_minutes: None,
            pace: Some(PaceProfile {
                pace_seconds: 0.0,
                fuel_per_lap: 3.0,
                fuel_carried: 100.0,
            }),
            description: None,
        }];
        let constants = RaceConstants {
            mandatory_driver_swaps: 1,
            ..RaceConstants::default()
        };
        let report = validate_scenario(
            &inputs,
            &default_catalog(),
            &constants,
            467.0,
            CatalogMode::General,
        );
        assert!(report.has_errors());
        assert!(report.errors().any(|d| d.context == "plans[0].pace"));
        assert_eq!(report.warnings().count(), 1);
    }
}
