//! Driver-swap placement.
//!
//! Position `p` means the pit after stint `p`, so valid positions lie strictly
//! between 0 and the stint count. Four generators propose layouts; each valid,
//! previously unseen layout is scored on how evenly it splits the race and
//! becomes a variant of the combination.

use crate::error::{PlannerError, Result};
use crate::optimizer::combination::{Combination, PlacementStrategy, SwapBias, SwapStrategy};

/// Score deducted per swap in the first two or last two pit slots.
pub const EDGE_PENALTY: f64 = 10.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub strategy: PlacementStrategy,
    pub positions: Vec<u32>,
}

/// Swap variants of `combination`, all strategies kept.
pub fn optimize_swap_placement(
    combination: &Combination,
    mandatory_swaps: u32,
) -> Result<Vec<Combination>> {
    SwapOptimizer::default().optimize(combination, mandatory_swaps)
}

#[derive(Debug, Clone, Copy)]
pub struct SwapOptimizer {
    /// Best-scoring variants kept per combination.
    pub max_variants: usize,
}

impl Default for SwapOptimizer {
    fn default() -> Self {
        Self { max_variants: 4 }
    }
}

impl SwapOptimizer {
    pub fn new(max_variants: usize) -> Self {
        Self {
            max_variants: max_variants.max(1),
        }
    }

    /// With no mandatory swaps the combination comes back unchanged.
    pub fn optimize(
        &self,
        combination: &Combination,
        mandatory_swaps: u32,
    ) -> Result<Vec<Combination>> {
        if mandatory_swaps == 0 {
            return Ok(vec![combination.clone()]);
        }
        if combination.total_pits < mandatory_swaps {
            return Err(PlannerError::InfeasibleConstraints {
                swaps: mandatory_swaps,
                pits: combination.total_pits,
            });
        }

        let total_stints = combination.total_stints;
        let mut variants: Vec<(usize, Placement, f64)> =
            candidate_placements(total_stints, mandatory_swaps)
                .into_iter()
                .enumerate()
                .map(|(index, placement)| {
                    let score = placement_score(&placement.positions, total_stints);
                    (index, placement, score)
                })
                .collect();
        variants.sort_by(|left, right| right.2.total_cmp(&left.2));
        variants.truncate(self.max_variants);

        Ok(variants
            .into_iter()
            .map(|(index, placement, score)| {
                let bias = swap_bias(&placement.positions, total_stints);
                Combination {
                    id: format!("{}_swap{index}", combination.signature),
                    swap_strategy: Some(SwapStrategy {
                        placement: placement.strategy,
                        bias,
                    }),
                    swap_placement: placement.positions,
                    swap_optimization_score: Some(score),
                    ..combination.clone()
                }
            })
            .collect())
    }
}

/// Valid, distinct layouts in generator order: even, early, late, quartile.
pub fn candidate_placements(total_stints: u32, swaps: u32) -> Vec<Placement> {
    if swaps == 0 || total_stints == 0 {
        return Vec::new();
    }

    let mut proposals = vec![
        Placement {
            strategy: PlacementStrategy::Even,
            positions: even_positions(total_stints, swaps),
        },
        Placement {
            strategy: PlacementStrategy::Early,
            positions: early_positions(total_stints, swaps),
        },
        Placement {
            strategy: PlacementStrategy::Late,
            positions: late_positions(total_stints, swaps),
        },
    ];
    if swaps >= 3 && total_stints >= 6 {
        proposals.push(Placement {
            strategy: PlacementStrategy::Quartile,
            positions: quartile_positions(total_stints, swaps),
        });
    }

    let mut accepted: Vec<Placement> = Vec::with_capacity(proposals.len());
    for proposal in proposals {
        if !is_valid_placement(&proposal.positions, total_stints, swaps) {
            continue;
        }
        if accepted.iter().any(|seen| seen.positions == proposal.positions) {
            continue;
        }
        accepted.push(proposal);
    }
    accepted
}

fn even_positions(total_stints: u32, swaps: u32) -> Vec<u32> {
    let interval = total_stints / (swaps + 1);
    (1..=swaps).map(|i| i * interval).collect()
}

/// Every second pit from the start, clamped so the swaps still to come fit
/// before the finish.
fn early_positions(total_stints: u32, swaps: u32) -> Vec<u32> {
    (1..=swaps)
        .map(|i| (i * 2).min((total_stints + i).saturating_sub(swaps + 1)))
        .collect()
}

fn late_positions(total_stints: u32, swaps: u32) -> Vec<u32> {
    let start = total_stints.saturating_sub(swaps);
    (0..swaps).map(|i| start + i).collect()
}

/// 25 / 50 / 75 % marks, extra swaps from 80 % onward in 5 % steps.
fn quartile_positions(total_stints: u32, swaps: u32) -> Vec<u32> {
    let mut positions = vec![
        total_stints * 25 / 100,
        total_stints * 50 / 100,
        total_stints * 75 / 100,
    ];
    for extra in 3..swaps {
        let percent = 80 + (extra - 3) * 5;
        positions.push((total_stints * percent / 100).min(total_stints - 1));
    }
    positions.truncate(swaps as usize);
    positions
}

pub fn is_valid_placement(positions: &[u32], total_stints: u32, swaps: u32) -> bool {
    positions.len() == swaps as usize
        && positions.iter().all(|&p| p > 0 && p < total_stints)
        && positions.windows(2).all(|pair| pair[0] < pair[1])
}

/// `100 - variance` of the gaps between swaps (start and finish included)
/// around the ideal even gap, minus [EDGE_PENALTY] per swap within two pits
/// of either end. Never below zero.
pub fn placement_score(positions: &[u32], total_stints: u32) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }

    let mut gaps = Vec::with_capacity(positions.len() + 1);
    let mut last = 0u32;
    for &position in positions {
        gaps.push(f64::from(position) - f64::from(last));
        last = position;
    }
    gaps.push(f64::from(total_stints) - f64::from(last));

    let ideal = f64::from(total_stints) / (positions.len() as f64 + 1.0);
    let variance = gaps.iter().map(|gap| (gap - ideal).powi(2)).sum::<f64>() / gaps.len() as f64;
    let distribution = (MAX_SCORE - variance).max(0.0);

    let early = positions.iter().filter(|&&p| p <= 2).count();
    let late = positions
        .iter()
        .filter(|&&p| i64::from(p) >= i64::from(total_stints) - 2)
        .count();
    (distribution - (early + late) as f64 * EDGE_PENALTY).max(0.0)
}

pub fn swap_bias(positions: &[u32], total_stints: u32) -> SwapBias {
    if positions.is_empty() {
        return SwapBias::Balanced;
    }
    let mean = positions.iter().map(|&p| f64::from(p)).sum::<f64>() / positions.len() as f64;
    let midpoint = f64::from(total_stints) / 2.0;
    if mean < midpoint * 0.6 {
        SwapBias::Early
    } else if mean > midpoint * 1.4 {
        SwapBias::Late
    } else {
        SwapBias::Balanced
    }
}
