use std::collections::{BTreeMap, BTreeSet};

use solvereign_config::SolverConfig;
use solvereign_core::{Assignment, Block, BlockType, FteClass, Roster, TourInstance};

/// A single audit check's outcome, before it is stamped into an
/// `AuditRecord` by the caller.
pub struct CheckOutcome {
    pub check_id: &'static str,
    pub passed: bool,
    pub message: String,
    pub counters: BTreeMap<String, u64>,
}

fn outcome(check_id: &'static str, passed: bool, message: impl Into<String>) -> CheckOutcome {
    CheckOutcome {
        check_id,
        passed,
        message: message.into(),
        counters: BTreeMap::new(),
    }
}

impl CheckOutcome {
    fn with_counters(mut self, counters: BTreeMap<String, u64>) -> Self {
        self.counters = counters;
        self
    }
}

struct PlanView<'a> {
    instances: &'a [TourInstance],
    blocks: &'a [Block],
    rosters: &'a [Roster],
    assignments: &'a [Assignment],
    config: &'a SolverConfig,
}

fn blocks_by_id(blocks: &[Block]) -> BTreeMap<&str, &Block> {
    blocks.iter().map(|b| (b.block_id.as_str(), b)).collect()
}

fn roster_spans(roster: &Roster, blocks: &BTreeMap<&str, &Block>) -> Vec<(chrono::NaiveDateTime, chrono::NaiveDateTime)> {
    let mut spans: Vec<(chrono::NaiveDateTime, chrono::NaiveDateTime)> = roster
        .block_ids
        .iter()
        .filter_map(|id| blocks.get(id.as_str()))
        .map(|b| (b.start, b.end))
        .collect();
    spans.sort();
    spans
}

/// C1: every instance is covered by exactly one assignment.
fn c1_coverage(view: &PlanView) -> CheckOutcome {
    let mut covered: BTreeMap<&str, u32> = BTreeMap::new();
    for a in view.assignments {
        *covered.entry(a.instance_id.as_str()).or_insert(0) += 1;
    }

    let all_ids: BTreeSet<&str> = view.instances.iter().map(|i| i.instance_id.as_str()).collect();
    let uncovered = all_ids.iter().filter(|id| !covered.contains_key(*id)).count();
    let duplicated = covered.values().filter(|&&count| count > 1).count();

    let mut counters = BTreeMap::new();
    counters.insert("uncovered".to_string(), uncovered as u64);
    counters.insert("duplicated".to_string(), duplicated as u64);

    let passed = uncovered == 0 && duplicated == 0;
    CheckOutcome {
        check_id: "C1_COVERAGE",
        passed,
        message: if passed {
            "every instance covered exactly once".to_string()
        } else {
            format!("{} uncovered, {} duplicated", uncovered, duplicated)
        },
        counters,
    }
}

/// C2: no two blocks assigned to the same roster overlap in time.
fn c2_no_overlap(view: &PlanView) -> CheckOutcome {
    let blocks = blocks_by_id(view.blocks);
    let mut violations = 0u64;

    for roster in view.rosters {
        let spans = roster_spans(roster, &blocks);
        for window in spans.windows(2) {
            if window[1].0 < window[0].1 {
                violations += 1;
            }
        }
    }

    let mut counters = BTreeMap::new();
    counters.insert("overlap_violations".to_string(), violations);
    outcome(
        "C2_NO_OVERLAP",
        violations == 0,
        format!("{} overlapping block pairs", violations),
    )
    .with_counters(counters)
}

/// C3: consecutive blocks on the same roster leave at least `min_rest_min`.
fn c3_rest(view: &PlanView) -> CheckOutcome {
    let blocks = blocks_by_id(view.blocks);
    let mut violations = 0u64;

    for roster in view.rosters {
        let spans = roster_spans(roster, &blocks);
        for window in spans.windows(2) {
            let gap = (window[1].0 - window[0].1).num_minutes();
            if gap < view.config.min_rest_min as i64 {
                violations += 1;
            }
        }
    }

    let mut counters = BTreeMap::new();
    counters.insert("rest_violations".to_string(), violations);
    outcome(
        "C3_REST",
        violations == 0,
        format!("{} inter-block rest violations", violations),
    )
    .with_counters(counters)
}

/// C4: ONE/TWO_REG blocks respect the regular span cap.
fn c4_span_regular(view: &PlanView) -> CheckOutcome {
    let offenders = view
        .blocks
        .iter()
        .filter(|b| matches!(b.block_type, BlockType::One | BlockType::TwoReg))
        .filter(|b| b.span_min > view.config.span_regular_max_min)
        .count();

    let mut counters = BTreeMap::new();
    counters.insert("offending_blocks".to_string(), offenders as u64);
    outcome(
        "C4_SPAN_REGULAR",
        offenders == 0,
        format!("{} ONE/TWO_REG blocks exceed the regular span cap", offenders),
    )
    .with_counters(counters)
}

/// C5: TWO_SPLIT blocks respect the split gap band and extended span cap;
/// THREE_CHAIN blocks respect the extended span cap.
fn c5_span_split(view: &PlanView) -> CheckOutcome {
    let instances_by_id: BTreeMap<&str, &TourInstance> = view
        .instances
        .iter()
        .map(|i| (i.instance_id.as_str(), i))
        .collect();

    let mut offenders = 0u64;
    for block in view.blocks {
        match block.block_type {
            BlockType::TwoSplit => {
                if block.span_min > view.config.three_chain_span_max_min {
                    offenders += 1;
                    continue;
                }
                let members: Vec<&TourInstance> = block
                    .instance_ids
                    .iter()
                    .filter_map(|id| instances_by_id.get(id.as_str()).copied())
                    .collect();
                if let [a, b] = members[..] {
                    let gap = (b.start - a.end).num_minutes();
                    if gap < view.config.split_break_min as i64 || gap > view.config.split_break_max as i64
                    {
                        offenders += 1;
                    }
                }
            }
            BlockType::ThreeChain => {
                if block.span_min > view.config.three_chain_span_max_min {
                    offenders += 1;
                }
            }
            BlockType::One | BlockType::TwoReg => {}
        }
    }

    let mut counters = BTreeMap::new();
    counters.insert("offending_blocks".to_string(), offenders);
    outcome(
        "C5_SPAN_SPLIT",
        offenders == 0,
        format!("{} TWO_SPLIT/THREE_CHAIN blocks violate gap or span bounds", offenders),
    )
    .with_counters(counters)
}

/// C6: no roster works THREE_CHAIN blocks on two consecutive calendar days.
fn c6_fatigue(view: &PlanView) -> CheckOutcome {
    let blocks = blocks_by_id(view.blocks);
    let mut violations = 0u64;

    for roster in view.rosters {
        let mut three_chain_dates: Vec<chrono::NaiveDate> = roster
            .block_ids
            .iter()
            .filter_map(|id| blocks.get(id.as_str()))
            .filter(|b| b.block_type == BlockType::ThreeChain)
            .map(|b| b.date)
            .collect();
        three_chain_dates.sort();
        three_chain_dates.dedup();
        for window in three_chain_dates.windows(2) {
            if (window[1] - window[0]).num_days() == 1 {
                violations += 1;
            }
        }
    }

    let mut counters = BTreeMap::new();
    counters.insert("fatigue_violations".to_string(), violations);
    outcome(
        "C6_FATIGUE",
        violations == 0,
        format!("{} rosters have back-to-back THREE_CHAIN days", violations),
    )
    .with_counters(counters)
}

/// C7: no roster exceeds the configured weekly minutes cap.
fn c7_max_weekly_hours(view: &PlanView) -> CheckOutcome {
    let offenders: Vec<&str> = view
        .rosters
        .iter()
        .filter(|r| r.total_work_minutes > view.config.weekly_hours_cap_min)
        .map(|r| r.roster_id.as_str())
        .collect();

    let mut counters = BTreeMap::new();
    counters.insert("offending_rosters".to_string(), offenders.len() as u64);
    outcome(
        "C7_MAX_WEEKLY_HOURS",
        offenders.is_empty(),
        format!("{} rosters exceed the weekly hours cap", offenders.len()),
    )
    .with_counters(counters)
}

/// Classifies total worked minutes into an `FteClass` per the configured
/// hour bands. Shared with roster generation's own classification.
pub fn classify(total_minutes: u32, config: &SolverConfig) -> FteClass {
    if total_minutes >= config.fte_target_band_min {
        FteClass::Fte
    } else if total_minutes >= config.core_pt_target_band_min {
        FteClass::CorePt
    } else {
        FteClass::FlexPt
    }
}

/// Runs all seven checks in fixed order C1..C7.
pub fn run_all(
    instances: &[TourInstance],
    blocks: &[Block],
    rosters: &[Roster],
    assignments: &[Assignment],
    config: &SolverConfig,
) -> Vec<CheckOutcome> {
    let view = PlanView {
        instances,
        blocks,
        rosters,
        assignments,
        config,
    };

    vec![
        c1_coverage(&view),
        c2_no_overlap(&view),
        c3_rest(&view),
        c4_span_regular(&view),
        c5_span_split(&view),
        c6_fatigue(&view),
        c7_max_weekly_hours(&view),
    ]
}
