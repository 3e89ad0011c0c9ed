//! Bounded search over stint-count assignments.
//!
//! Plans are visited in catalog order and every count from 0 to the per-plan
//! cap is tried. A branch is cut as soon as its running stint time passes the
//! overtime ceiling, or a rough estimate that adds regular pit losses passes
//! the ceiling by more than the tolerance. Both bounds only grow with the
//! count, so the remaining counts of the same plan are skipped too.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::debug;

use crate::config::{CatalogMode, SearchLimits};
use crate::data::plan::StintPlan;
use crate::error::{PlannerError, Result};
use crate::optimizer::combination::{stint_time, Combination};
use crate::parallel::WorkerPool;

pub const FIXED_CATALOG_SIZE: usize = 3;

/// Reject inputs the search cannot run on.
pub fn check_inputs(plans: &[StintPlan], required_minutes: f64) -> Result<()> {
    if !(required_minutes > 0.0) || !required_minutes.is_finite() {
        return Err(PlannerError::InvalidRequirement(required_minutes));
    }
    if plans.is_empty() {
        return Err(PlannerError::InvalidPlanSet(
            "plan catalog is empty".to_string(),
        ));
    }
    if let Some(plan) = plans.iter().find(|plan| plan.stint_duration_minutes == 0) {
        return Err(PlannerError::InvalidPlanSet(format!(
            "plan '{}' has a non-positive stint duration",
            plan.id
        )));
    }
    if let Some(id) = duplicate_id(plans) {
        return Err(PlannerError::InvalidPlanSet(format!(
            "plan id '{id}' is used more than once"
        )));
    }
    Ok(())
}

/// First plan id that appears twice. Signatures are keyed by id.
pub fn duplicate_id(plans: &[StintPlan]) -> Option<&str> {
    let mut seen = HashSet::new();
    plans
        .iter()
        .map(|plan| plan.id.as_str())
        .find(|id| !seen.insert(*id))
}

/// Enumerate with the general limits (8 per plan, 20 stints, 30 min overtime,
/// coverage required) and no pit-cost estimate.
pub fn enumerate_combinations(
    plans: &[StintPlan],
    required_minutes: f64,
    mandatory_swaps: u32,
) -> Result<Vec<Combination>> {
    Enumerator::new(SearchLimits::general()).enumerate(plans, required_minutes, mandatory_swaps)
}

#[derive(Debug, Clone)]
pub struct Enumerator {
    limits: SearchLimits,
    mode: CatalogMode,
    pit_estimate_minutes: f64,
}

impl Enumerator {
    pub fn new(limits: SearchLimits) -> Self {
        Self {
            limits,
            mode: CatalogMode::General,
            pit_estimate_minutes: 0.0,
        }
    }

    pub fn with_mode(self, mode: CatalogMode) -> Self {
        Self { mode, ..self }
    }

    /// Regular pit length used by the rough pruning estimate.
    pub fn with_pit_estimate(self, minutes: f64) -> Self {
        Self {
            pit_estimate_minutes: minutes.max(0.0),
            ..self
        }
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    pub fn enumerate(
        &self,
        plans: &[StintPlan],
        required_minutes: f64,
        mandatory_swaps: u32,
    ) -> Result<Vec<Combination>> {
        self.check(plans, required_minutes)?;
        let bounds = self.bounds(required_minutes, mandatory_swaps);

        let found = match self.mode {
            CatalogMode::FixedThree => bounds.flattened_three(plans),
            CatalogMode::General => {
                let mut search = Search::new(&bounds, plans);
                search.descend(0, 0, 0);
                search.found
            }
        };

        debug!(
            event = "enumerate_end",
            plans = plans.len(),
            required_minutes,
            mandatory_swaps,
            found = found.len(),
        );
        Ok(found)
    }

    /// Same result and order as [Enumerator::enumerate], with one task per
    /// count of the first plan.
    pub fn enumerate_parallel(
        &self,
        plans: &[StintPlan],
        required_minutes: f64,
        mandatory_swaps: u32,
        pool: &WorkerPool,
    ) -> Result<Vec<Combination>> {
        self.check(plans, required_minutes)?;
        let bounds = self.bounds(required_minutes, mandatory_swaps);
        let first = plans[0].stint_duration_minutes;

        let branches: Vec<Vec<Combination>> = pool.install(|| {
            (0..=bounds.limits.max_per_plan)
                .into_par_iter()
                .map(|count| {
                    let Some(time) = count.checked_mul(first) else {
                        return Vec::new();
                    };
                    if count > bounds.limits.max_total_stints || bounds.exceeds(count, time) {
                        return Vec::new();
                    }
                    let mut search = Search::new(&bounds, plans);
                    search.counts[0] = count;
                    search.descend(1, count, time);
                    search.found
                })
                .collect()
        });

        let found: Vec<Combination> = branches.into_iter().flatten().collect();
        debug!(
            event = "enumerate_parallel_end",
            plans = plans.len(),
            workers = pool.workers,
            found = found.len(),
        );
        Ok(found)
    }

    fn check(&self, plans: &[StintPlan], required_minutes: f64) -> Result<()> {
        check_inputs(plans, required_minutes)?;
        if self.mode == CatalogMode::FixedThree && plans.len() != FIXED_CATALOG_SIZE {
            return Err(PlannerError::InvalidPlanSet(format!(
                "fixed three-plan mode needs exactly {FIXED_CATALOG_SIZE} plans, got {}",
                plans.len()
            )));
        }
        Ok(())
    }

    fn bounds(&self, required_minutes: f64, mandatory_swaps: u32) -> Bounds {
        Bounds {
            limits: self.limits,
            required: required_minutes,
            swaps: mandatory_swaps,
            pit_estimate: self.pit_estimate_minutes,
        }
    }
}

struct Bounds {
    limits: SearchLimits,
    required: f64,
    swaps: u32,
    pit_estimate: f64,
}

impl Bounds {
    fn ceiling(&self) -> f64 {
        self.required + self.limits.max_overtime_minutes
    }

    fn exceeds(&self, stints: u32, time: u32) -> bool {
        let time = f64::from(time);
        if time > self.ceiling() {
            return true;
        }
        let pits = f64::from(stints.saturating_sub(1));
        time + pits * self.pit_estimate > self.ceiling() + self.limits.max_overtime_minutes
    }

    fn accepts(&self, stints: u32, time: u32) -> bool {
        if stints == 0 || stints > self.limits.max_total_stints {
            return false;
        }
        if stints - 1 < self.swaps {
            return false;
        }
        let over_time = f64::from(time) - self.required;
        self.limits
            .overtime_policy
            .accepts(over_time, self.limits.max_overtime_minutes)
    }

    /// Triple loop over a three-plan catalog. Visits assignments in the same
    /// order as the recursive search and keeps the same ones.
    fn flattened_three(&self, plans: &[StintPlan]) -> Vec<Combination> {
        let cap = self.limits.max_per_plan;
        let durations = [
            plans[0].stint_duration_minutes,
            plans[1].stint_duration_minutes,
            plans[2].stint_duration_minutes,
        ];
        let mut found = Vec::new();

        for first in 0..=cap {
            for second in 0..=cap {
                for third in 0..=cap {
                    let stints = first + second + third;
                    if stints == 0 || stints > self.limits.max_total_stints {
                        continue;
                    }
                    let Some(time) = stint_time(plans, &[first, second, third]) else {
                        continue;
                    };
                    if self.exceeds(stints, time) || !self.accepts(stints, time) {
                        continue;
                    }
                    found.push(Combination::from_counts(
                        plans,
                        &[first, second, third],
                        self.required,
                        self.swaps,
                    ));
                }
            }
        }

        found
    }
}

struct Search<'a> {
    bounds: &'a Bounds,
    plans: &'a [StintPlan],
    counts: Vec<u32>,
    found: Vec<Combination>,
}

impl<'a> Search<'a> {
    fn new(bounds: &'a Bounds, plans: &'a [StintPlan]) -> Self {
        Self {
            bounds,
            plans,
            counts: vec![0; plans.len()],
            found: Vec::new(),
        }
    }

    fn descend(&mut self, plan_index: usize, stints: u32, time: u32) {
        if plan_index == self.plans.len() {
            if self.bounds.accepts(stints, time) {
                self.found.push(Combination::from_counts(
                    self.plans,
                    &self.counts,
                    self.bounds.required,
                    self.bounds.swaps,
                ));
            }
            return;
        }

        let duration = self.plans[plan_index].stint_duration_minutes;
        for count in 0..=self.bounds.limits.max_per_plan {
            let next_stints = stints + count;
            // an overflowing time is past any ceiling, and so is every larger count
            let Some(next_time) = count
                .checked_mul(duration)
                .and_then(|added| time.checked_add(added))
            else {
                break;
            };
            if next_stints > self.bounds.limits.max_total_stints
                || self.bounds.exceeds(next_stints, next_time)
            {
                break;
            }
            self.counts[plan_index] = count;
            self.descend(plan_index + 1, next_stints, next_time);
        }
        self.counts[plan_index] = 0;
    }
}
