//! "Naturally filled" strategies a strategist would sketch by hand: a few
//! balanced stints, then whatever is left driven flat out. A leftover shorter
//! than a full stint still takes a whole stint to drive, so it rounds up.

use tracing::debug;

use crate::config::SearchLimits;
use crate::data::plan::StintPlan;
use crate::error::Result;
use crate::optimizer::combination::{stint_time, Combination};
use crate::optimizer::enumerator::check_inputs;

/// Balanced-plan base counts tried, `1..=MAX_BALANCED_BASE`.
pub const MAX_BALANCED_BASE: u32 = 6;

const LEFTOVER_EPSILON: f64 = 1e-9;

/// Catalog positions of the three driving styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRoles {
    pub aggressive: usize,
    pub balanced: usize,
    pub conservative: usize,
}

impl PlanRoles {
    /// Three plans are read as `[aggressive, balanced, conservative]`. Larger
    /// catalogs take the shortest stint as aggressive, the longest as
    /// conservative and the median as balanced. Fewer than three: no roles.
    pub fn from_catalog(plans: &[StintPlan]) -> Option<Self> {
        match plans.len() {
            0..=2 => None,
            3 => Some(Self {
                aggressive: 0,
                balanced: 1,
                conservative: 2,
            }),
            len => {
                let mut order: Vec<usize> = (0..len).collect();
                order.sort_by_key(|&i| (plans[i].stint_duration_minutes, i));
                Some(Self {
                    aggressive: order[0],
                    balanced: order[len / 2],
                    conservative: order[len - 1],
                })
            }
        }
    }
}

pub fn auto_adjusted_combinations(
    plans: &[StintPlan],
    required_minutes: f64,
    mandatory_swaps: u32,
    limits: &SearchLimits,
) -> Result<Vec<Combination>> {
    check_inputs(plans, required_minutes)?;
    let Some(roles) = PlanRoles::from_catalog(plans) else {
        debug!(plans = plans.len(), "auto adjustment needs three driving styles, skipping");
        return Ok(Vec::new());
    };

    let aggressive = &plans[roles.aggressive];
    let balanced = &plans[roles.balanced];
    let conservative = &plans[roles.conservative];
    let aggressive_minutes = f64::from(aggressive.stint_duration_minutes);
    let conservative_minutes = f64::from(conservative.stint_duration_minutes);

    let mut found = Vec::new();
    for base in 1..=MAX_BALANCED_BASE {
        let Some(balanced_time) = base.checked_mul(balanced.stint_duration_minutes) else {
            break;
        };
        let remaining = required_minutes - f64::from(balanced_time);
        if remaining <= 0.0 {
            continue;
        }

        // Balanced base topped up with aggressive stints.
        let full = (remaining / aggressive_minutes).floor();
        let leftover = remaining - full * aggressive_minutes;
        let rounded = leftover > LEFTOVER_EPSILON;
        let aggressive_count = (full as u32).saturating_add(u32::from(rounded));

        let mut counts = vec![0; plans.len()];
        counts[roles.balanced] = base;
        counts[roles.aggressive] = aggressive_count;
        let note = format!(
            "{base}x {} covers {balanced_time}m; remaining {remaining:.0}m filled with {aggressive_count}x {}{}",
            balanced.name,
            aggressive.name,
            if rounded { " (partial stint rounded up)" } else { "" },
        );
        push_admissible(
            &mut found,
            plans,
            &counts,
            required_minutes,
            mandatory_swaps,
            limits,
            note,
        );

        // Conservative stints first, aggressive stints for what they leave.
        let conservative_count = (remaining / conservative_minutes).floor();
        if conservative_count < 1.0 {
            continue;
        }
        let leftover = remaining - conservative_count * conservative_minutes;
        let top_up = if leftover > LEFTOVER_EPSILON {
            (leftover / aggressive_minutes).ceil() as u32
        } else {
            0
        };

        let mut counts = vec![0; plans.len()];
        counts[roles.balanced] = base;
        counts[roles.conservative] = conservative_count as u32;
        counts[roles.aggressive] += top_up;
        let note = format!(
            "{base}x {} covers {balanced_time}m; remaining {remaining:.0}m filled with {}x {} and {top_up}x {}",
            balanced.name, conservative_count as u32, conservative.name, aggressive.name,
        );
        push_admissible(
            &mut found,
            plans,
            &counts,
            required_minutes,
            mandatory_swaps,
            limits,
            note,
        );
    }

    debug!(event = "auto_adjust_end", found = found.len());
    Ok(found)
}

/// Keep the candidate only if it passes the same caps, pit feasibility and
/// overtime rule as enumerated strategies.
fn push_admissible(
    found: &mut Vec<Combination>,
    plans: &[StintPlan],
    counts: &[u32],
    required_minutes: f64,
    mandatory_swaps: u32,
    limits: &SearchLimits,
    note: String,
) {
    if counts.iter().any(|&count| count > limits.max_per_plan)
        || stint_time(plans, counts).is_none()
    {
        return;
    }
    let combo = Combination::from_counts(plans, counts, required_minutes, mandatory_swaps);
    if combo.total_stints == 0
        || combo.total_stints > limits.max_total_stints
        || combo.total_pits < mandatory_swaps
        || !limits
            .overtime_policy
            .accepts(combo.over_time, limits.max_overtime_minutes)
    {
        return;
    }
    if found.iter().any(|existing| existing.signature == combo.signature) {
        return;
    }
    found.push(combo.auto_adjusted(note));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::plan::default_catalog;

    fn counts(found: &[Combination]) -> Vec<Vec<u32>> {
        found.iter().map(Combination::count_vector).collect()
    }

    #[test]
    fn three_semi_and_one_push_for_a_300_minute_requirement() {
        let plans = default_catalog();
        let found = auto_adjusted_combinations(&plans, 300.0, 3, &SearchLimits::general())
            .expect("valid inputs");

        let combo = found
            .iter()
            .find(|c| c.count_vector() == vec![1, 3, 0])
            .expect("3x semi + 1x push should be produced");
        assert!(combo.is_auto_adjusted);
        assert_eq!(combo.total_stint_time, 315);
        assert_eq!(combo.over_time, 15.0);
        let note = combo.adjustment_note.as_deref().unwrap_or_default();
        assert!(note.contains("rounded up"), "note was {note}");
    }

    #[test]
    fn both_fill_families_are_produced_and_filtered() {
        let plans = default_catalog();
        let found = auto_adjusted_combinations(&plans, 300.0, 3, &SearchLimits::general())
            .expect("valid inputs");
        // base 1: [3,1,0] 305 ok, [1,1,2] 335 over tolerance
        // base 2: [2,2,0] 310 ok, [1,2,1] 325 ok
        // base 3: [1,3,0] 315 ok; bases 4..6 already cover the race
        assert_eq!(
            counts(&found),
            vec![vec![3, 1, 0], vec![2, 2, 0], vec![1, 2, 1], vec![1, 3, 0]]
        );
        assert!(found.iter().all(|c| c.is_auto_adjusted));
    }

    #[test]
    fn pit_feasibility_is_enforced() {
        let plans = default_catalog();
        let found = auto_adjusted_combinations(&plans, 300.0, 4, &SearchLimits::general())
            .expect("valid inputs");
        assert!(found.iter().all(|c| c.total_pits >= 4));
    }

    #[test]
    fn small_catalogs_produce_nothing() {
        let plans = vec![StintPlan::new("a", "A", 60), StintPlan::new("b", "B", 70)];
        let found = auto_adjusted_combinations(&plans, 300.0, 0, &SearchLimits::general())
            .expect("valid inputs");
        assert!(found.is_empty());
    }

    #[test]
    fn larger_catalogs_pick_roles_by_duration() {
        let plans = vec![
            StintPlan::new("c", "C", 90),
            StintPlan::new("a", "A", 60),
            StintPlan::new("d", "D", 100),
            StintPlan::new("b", "B", 75),
        ];
        let roles = PlanRoles::from_catalog(&plans).expect("four plans have roles");
        assert_eq!(roles.aggressive, 1);
        assert_eq!(roles.balanced, 0);
        assert_eq!(roles.conservative, 2);
    }

    #[test]
    fn huge_durations_are_skipped_instead_of_overflowing() {
        let plans = vec![
            StintPlan::new("push", "Push", 75),
            StintPlan::new("semi", "Semi", 1_000_000_000),
            StintPlan::new("full", "Full", 90),
        ];
        let found = auto_adjusted_combinations(&plans, 300.0, 0, &SearchLimits::general())
            .expect("valid inputs");
        assert!(found.is_empty());

        let plans = vec![
            StintPlan::new("push", "Push", 3_000_000_000),
            StintPlan::new("semi", "Semi", 60),
            StintPlan::new("full", "Full", 90),
        ];
        let found = auto_adjusted_combinations(&plans, 3.5e9, 0, &SearchLimits::general())
            .expect("valid inputs");
        assert!(found.is_empty());
    }
}
