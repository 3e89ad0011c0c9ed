use pitwall::config::{CatalogMode, DedupMode, PlannerConfig};
use pitwall::data::plan::{default_catalog, StintPlan};
use pitwall::data::validate::validate_parameters;
use pitwall::optimizer::auto_adjust::auto_adjusted_combinations;
use pitwall::optimizer::ranking::{dedup_combinations, rank_combinations};
use pitwall::optimizer::swap_placement::optimize_swap_placement;
use pitwall::{enumerate_combinations, plan_strategies, PlannerError, StrategyRequest};

fn request(required_minutes: f64, mandatory_swaps: u32) -> StrategyRequest {
    StrategyRequest {
        plans: default_catalog(),
        required_minutes,
        mandatory_swaps,
        constants: None,
    }
}

#[test]
fn eight_hour_race_has_covering_strategies() {
    let found = enumerate_combinations(&default_catalog(), 467.0, 3).expect("valid inputs");
    assert!(!found.is_empty());
    for combo in &found {
        assert!(
            (0.0..=30.0).contains(&combo.over_time),
            "{} has over_time {}",
            combo.id,
            combo.over_time
        );
        assert!(f64::from(combo.total_stint_time) >= 467.0);
    }
}

#[test]
fn pit_split_adds_up_for_every_result() {
    let report = plan_strategies(&request(467.0, 3), &PlannerConfig::default())
        .expect("valid request");
    assert!(!report.combinations.is_empty());
    for combo in &report.combinations {
        assert!(combo.total_pits >= combo.driver_swap_pits);
        assert_eq!(combo.regular_pits + combo.driver_swap_pits, combo.total_pits);
        assert_eq!(combo.driver_swap_pits, 3);
    }
}

#[test]
fn swap_placements_are_strictly_increasing_and_inside_the_race() {
    let config = PlannerConfig {
        dedup: DedupMode::SwapVariant,
        ..PlannerConfig::default()
    };
    let report = plan_strategies(&request(467.0, 3), &config).expect("valid request");
    for combo in &report.combinations {
        assert_eq!(combo.swap_placement.len(), 3, "{}", combo.id);
        assert!(combo.swap_placement.windows(2).all(|w| w[0] < w[1]));
        assert!(combo
            .swap_placement
            .iter()
            .all(|&p| p > 0 && p < combo.total_stints));
        assert!(combo.swap_optimization_score.is_some());
    }
}

#[test]
fn three_semi_one_push_is_auto_adjusted_for_300_minutes() {
    let report = plan_strategies(&request(300.0, 3), &PlannerConfig::default())
        .expect("valid request");
    let combo = report
        .combinations
        .iter()
        .find(|c| c.count_of("semi") == 3 && c.count_of("push") == 1 && c.count_of("full") == 0)
        .expect("3x semi + 1x push should be offered");
    assert!(combo.is_auto_adjusted);
    assert_eq!(combo.total_stint_time, 315);
    assert_eq!(combo.over_time, 15.0);
}

#[test]
fn too_many_swaps_is_reported_and_yields_nothing() {
    let plans = default_catalog();
    let result = validate_parameters(&plans, 375.0, 5, CatalogMode::FixedThree);
    assert!(!result.is_valid);

    let found = enumerate_combinations(&plans, 375.0, 5).expect("valid inputs");
    assert!(found.is_empty());
}

#[test]
fn a_single_long_stint_cannot_cover_a_short_requirement() {
    let plans = vec![StintPlan::new("long", "Long", 100)];
    let found = enumerate_combinations(&plans, 50.0, 0).expect("valid inputs");
    assert!(found.is_empty());
}

#[test]
fn invalid_inputs_fail_before_search() {
    assert!(matches!(
        plan_strategies(&request(-1.0, 3), &PlannerConfig::default()),
        Err(PlannerError::InvalidRequirement(_))
    ));
    let empty = StrategyRequest {
        plans: Vec::new(),
        ..request(300.0, 0)
    };
    assert!(matches!(
        plan_strategies(&empty, &PlannerConfig::default()),
        Err(PlannerError::InvalidPlanSet(_))
    ));
}

#[test]
fn swap_placement_refuses_more_swaps_than_pits() {
    let plans = default_catalog();
    let combo = &enumerate_combinations(&plans, 300.0, 0).expect("valid inputs")[0];
    let swaps = combo.total_pits + 1;
    assert_eq!(
        optimize_swap_placement(combo, swaps),
        Err(PlannerError::InfeasibleConstraints {
            swaps,
            pits: combo.total_pits
        })
    );
}

#[test]
fn dedup_is_idempotent_and_ranking_is_stable() {
    let plans = default_catalog();
    let mut all = auto_adjusted_combinations(
        &plans,
        467.0,
        3,
        &PlannerConfig::default().effective_limits(),
    )
    .expect("valid inputs");
    for combo in enumerate_combinations(&plans, 467.0, 3).expect("valid inputs") {
        all.extend(optimize_swap_placement(&combo, 3).expect("feasible"));
    }

    let ranked = rank_combinations(all);
    assert_eq!(rank_combinations(ranked.clone()), ranked);

    for mode in [DedupMode::Signature, DedupMode::SwapVariant] {
        let once = dedup_combinations(ranked.clone(), mode);
        let twice = dedup_combinations(once.clone(), mode);
        assert_eq!(once, twice);
    }
}

#[test]
fn parallel_pipeline_matches_sequential() {
    let sequential = plan_strategies(&request(612.0, 4), &PlannerConfig::default())
        .expect("valid request");
    let config = PlannerConfig {
        parallel_workers: 2,
        ..PlannerConfig::default()
    };
    let parallel = plan_strategies(&request(612.0, 4), &config).expect("valid request");
    assert_eq!(sequential.combinations, parallel.combinations);
}
