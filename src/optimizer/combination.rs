use serde::Serialize;

use crate::data::constants::RaceConstants;
use crate::data::plan::StintPlan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanCount {
    pub plan_id: String,
    pub plan_name: String,
    pub count: u32,
}

/// Which placement generator produced a swap layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    Even,
    Early,
    Late,
    Quartile,
}

/// Where the swaps sit on average relative to the race midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapBias {
    Early,
    Balanced,
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapStrategy {
    pub placement: PlacementStrategy,
    pub bias: SwapBias,
}

/// Race clock estimate once pit losses are added to the stint time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RaceEstimate {
    pub pit_minutes: f64,
    pub total_race_time: f64,
    pub race_delta: f64,
}

/// One candidate strategy: how many stints of each plan, and where the
/// mandatory swaps go. Built once per stage; later stages produce new values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Combination {
    pub id: String,
    /// Plan-count signature, shared by all swap variants of the same counts.
    pub signature: String,
    pub counts: Vec<PlanCount>,
    pub total_stints: u32,
    pub total_stint_time: u32,
    pub total_pits: u32,
    pub regular_pits: u32,
    pub driver_swap_pits: u32,
    pub over_time: f64,
    pub efficiency: f64,
    pub is_auto_adjusted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment_note: Option<String>,
    pub swap_placement: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_optimization_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_strategy: Option<SwapStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race_estimate: Option<RaceEstimate>,
}

impl Combination {
    /// Build from per-plan counts, `counts[i]` belonging to `plans[i]`.
    /// `required_minutes` must already be validated as positive. Callers check
    /// [stint_time] first; an overflowing total is pinned to `u32::MAX`.
    pub fn from_counts(
        plans: &[StintPlan],
        counts: &[u32],
        required_minutes: f64,
        mandatory_swaps: u32,
    ) -> Self {
        debug_assert_eq!(plans.len(), counts.len());

        let counts: Vec<PlanCount> = plans
            .iter()
            .zip(counts)
            .map(|(plan, &count)| PlanCount {
                plan_id: plan.id.clone(),
                plan_name: plan.name.clone(),
                count,
            })
            .collect();

        let total_stints: u32 = counts.iter().fold(0, |sum, c| sum.saturating_add(c.count));
        let raw: Vec<u32> = counts.iter().map(|c| c.count).collect();
        let total_stint_time = stint_time(plans, &raw).unwrap_or(u32::MAX);
        let total_pits = total_stints.saturating_sub(1);
        let driver_swap_pits = mandatory_swaps.min(total_pits);
        let over_time = f64::from(total_stint_time) - required_minutes;
        let signature = signature_of(&counts);

        Self {
            id: signature.clone(),
            signature,
            counts,
            total_stints,
            total_stint_time,
            total_pits,
            regular_pits: total_pits - driver_swap_pits,
            driver_swap_pits,
            over_time,
            efficiency: over_time.abs() / required_minutes * 100.0,
            is_auto_adjusted: false,
            adjustment_note: None,
            swap_placement: Vec::new(),
            swap_optimization_score: None,
            swap_strategy: None,
            race_estimate: None,
        }
    }

    pub fn auto_adjusted(self, note: impl Into<String>) -> Self {
        Self {
            is_auto_adjusted: true,
            adjustment_note: Some(note.into()),
            ..self
        }
    }

    pub fn with_race_estimate(self, constants: &RaceConstants) -> Self {
        let pit_minutes = constants.pit_time_minutes(self.regular_pits, self.driver_swap_pits);
        let total_race_time = f64::from(self.total_stint_time) + pit_minutes;
        Self {
            race_estimate: Some(RaceEstimate {
                pit_minutes,
                total_race_time,
                race_delta: total_race_time - constants.race_minutes(),
            }),
            ..self
        }
    }

    pub fn count_of(&self, plan_id: &str) -> u32 {
        self.counts
            .iter()
            .find(|c| c.plan_id == plan_id)
            .map_or(0, |c| c.count)
    }

    pub fn count_vector(&self) -> Vec<u32> {
        self.counts.iter().map(|c| c.count).collect()
    }

    /// Plain `"3x Semi Lift + 1x Push"` label, zero counts omitted.
    pub fn label(&self) -> String {
        self.counts
            .iter()
            .filter(|c| c.count > 0)
            .map(|c| format!("{}x {}", c.count, c.plan_name))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// Total driving minutes for `counts`, `None` when it does not fit in a `u32`.
pub fn stint_time(plans: &[StintPlan], counts: &[u32]) -> Option<u32> {
    plans.iter().zip(counts).try_fold(0u32, |total, (plan, &count)| {
        count
            .checked_mul(plan.stint_duration_minutes)
            .and_then(|time| total.checked_add(time))
    })
}

fn signature_of(counts: &[PlanCount]) -> String {
    counts
        .iter()
        .filter(|c| c.count > 0)
        .map(|c| format!("{}-{}", c.plan_id, c.count))
        .collect::<Vec<_>>()
        .join("_")
}
