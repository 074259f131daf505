use std::collections::BTreeMap;

use solvereign_config::SolverConfig;
use solvereign_core::{Block, FteClass, Roster};

use crate::error::ValidationError;

/// Finds the first REST (or overlap) violation, returning the roster index
/// and the block id that should move (the later of the offending pair, by
/// start time).
fn find_rest_violation(rosters: &[Roster], blocks: &BTreeMap<&str, &Block>, config: &SolverConfig) -> Option<(usize, String)> {
    for (idx, roster) in rosters.iter().enumerate() {
        let mut spans: Vec<(&str, chrono::NaiveDateTime, chrono::NaiveDateTime)> = roster
            .block_ids
            .iter()
            .filter_map(|id| blocks.get(id.as_str()).map(|b| (id.as_str(), b.start, b.end)))
            .collect();
        spans.sort_by(|a, b| a.1.cmp(&b.1));

        for window in spans.windows(2) {
            let overlaps = window[1].1 < window[0].2;
            let rest_gap = (window[1].1 - window[0].2).num_minutes();
            let rest_violation = rest_gap < config.min_rest_min as i64;
            if overlaps || rest_violation {
                return Some((idx, window[1].0.to_string()));
            }
        }
    }
    None
}

/// Finds the first roster exceeding the weekly hours cap.
fn find_weekly_hours_violation(rosters: &[Roster], config: &SolverConfig) -> Option<usize> {
    rosters.iter().position(|r| r.total_work_minutes > config.weekly_hours_cap_min)
}

/// A roster's block set has no internal overlap and leaves `min_rest_min`
/// between every consecutive pair.
fn roster_internally_ok(roster: &Roster, blocks: &BTreeMap<&str, &Block>, config: &SolverConfig) -> bool {
    let mut spans: Vec<(chrono::NaiveDateTime, chrono::NaiveDateTime)> = roster
        .block_ids
        .iter()
        .filter_map(|id| blocks.get(id.as_str()))
        .map(|b| (b.start, b.end))
        .collect();
    spans.sort();
    spans.windows(2).all(|w| {
        let overlaps = w[1].0 < w[0].1;
        let gap = (w[1].0 - w[0].1).num_minutes();
        !overlaps && gap >= config.min_rest_min as i64
    })
}

/// 2-step swap: looks for another roster holding a block that can trade
/// places with `block_id` such that both rosters pass their own rest/overlap
/// check afterward. Returns the partner roster's index and the block it
/// offers in exchange.
fn find_swap_partner(
    current: &[Roster],
    idx: usize,
    block_id: &str,
    blocks: &BTreeMap<&str, &Block>,
    config: &SolverConfig,
) -> Option<(usize, String)> {
    for (other_idx, other) in current.iter().enumerate() {
        if other_idx == idx {
            continue;
        }
        for other_block_id in &other.block_ids {
            let mut a_ids = current[idx].block_ids.clone();
            a_ids.retain(|id| id != block_id);
            a_ids.push(other_block_id.clone());
            let mut b_ids = other.block_ids.clone();
            b_ids.retain(|id| id != other_block_id);
            b_ids.push(block_id.to_string());

            let a_candidate = Roster { block_ids: a_ids, ..current[idx].clone() };
            let b_candidate = Roster { block_ids: b_ids, ..other.clone() };

            if roster_internally_ok(&a_candidate, blocks, config)
                && roster_internally_ok(&b_candidate, blocks, config)
            {
                return Some((other_idx, other_block_id.clone()));
            }
        }
    }
    None
}

fn swap_blocks(
    current: &mut [Roster],
    idx: usize,
    block_id: &str,
    other_idx: usize,
    other_block_id: &str,
    blocks: &BTreeMap<&str, &Block>,
    config: &SolverConfig,
) {
    current[idx].block_ids.retain(|id| id != block_id);
    current[idx].block_ids.push(other_block_id.to_string());
    current[other_idx].block_ids.retain(|id| id != other_block_id);
    current[other_idx].block_ids.push(block_id.to_string());
    recompute_roster_totals(&mut current[idx], blocks, config);
    recompute_roster_totals(&mut current[other_idx], blocks, config);
}

/// Bump/absorb: removes `block_id` from the offending roster and absorbs it
/// into its pre-generated singleton roster (or a freshly built fallback).
fn bump_to_singleton(
    current: &mut Vec<Roster>,
    idx: usize,
    block_id: &str,
    roster_pool_by_id: &BTreeMap<String, Roster>,
    blocks: &BTreeMap<&str, &Block>,
    config: &SolverConfig,
) {
    current[idx].block_ids.retain(|id| id != block_id);
    recompute_roster_totals(&mut current[idx], blocks, config);

    let singleton_id = format!("R-SINGLE-{}", block_id);
    let singleton = roster_pool_by_id
        .get(&singleton_id)
        .cloned()
        .unwrap_or_else(|| fallback_singleton(&singleton_id, block_id, blocks));

    if !current.iter().any(|r| r.roster_id == singleton.roster_id) {
        current.push(singleton);
    }
}

/// The roster's latest-starting block, the natural candidate to shed when a
/// roster is over the weekly hours cap.
fn latest_block_id(roster: &Roster, blocks: &BTreeMap<&str, &Block>) -> Option<String> {
    roster
        .block_ids
        .iter()
        .filter_map(|id| blocks.get(id.as_str()).map(|b| (id.clone(), b.start)))
        .max_by_key(|(_, start)| *start)
        .map(|(id, _)| id)
}

/// Bounded repair: REST (and overlap) violations are resolved with a 2-step
/// swap between the offending roster and a partner, falling back to
/// bump/absorb if no swap partner exists; MAX_WEEKLY_HOURS overflow is
/// always resolved by bump/absorb. Runs up to `budget` operations total.
/// Returns the repaired roster set or `ValidationError::RepairExhausted` if
/// violations remain once the budget runs out.
pub fn repair(
    rosters: Vec<Roster>,
    roster_pool_by_id: &BTreeMap<String, Roster>,
    blocks: &[Block],
    config: &SolverConfig,
    budget: u32,
) -> Result<Vec<Roster>, ValidationError> {
    let blocks_by_id: BTreeMap<&str, &Block> =
        blocks.iter().map(|b| (b.block_id.as_str(), b)).collect();

    let mut current = rosters;
    let mut ops_used = 0u32;

    loop {
        if let Some((idx, block_id)) = find_rest_violation(&current, &blocks_by_id, config) {
            if ops_used >= budget {
                return Err(ValidationError::RepairExhausted { budget });
            }
            match find_swap_partner(&current, idx, &block_id, &blocks_by_id, config) {
                Some((other_idx, other_block_id)) => {
                    swap_blocks(&mut current, idx, &block_id, other_idx, &other_block_id, &blocks_by_id, config);
                }
                None => bump_to_singleton(&mut current, idx, &block_id, roster_pool_by_id, &blocks_by_id, config),
            }
            ops_used += 1;
            continue;
        }

        if let Some(idx) = find_weekly_hours_violation(&current, config) {
            if ops_used >= budget {
                return Err(ValidationError::RepairExhausted { budget });
            }
            if let Some(block_id) = latest_block_id(&current[idx], &blocks_by_id) {
                bump_to_singleton(&mut current, idx, &block_id, roster_pool_by_id, &blocks_by_id, config);
                ops_used += 1;
                continue;
            }
        }

        return Ok(current);
    }
}

fn fallback_singleton(id: &str, block_id: &str, blocks: &BTreeMap<&str, &Block>) -> Roster {
    let work_min = blocks.get(block_id).map(|b| b.work_min).unwrap_or(0);
    Roster {
        roster_id: id.to_string(),
        driver_label: format!("repaired::{}", block_id),
        fte_class: FteClass::FlexPt,
        block_ids: vec![block_id.to_string()],
        total_work_minutes: work_min,
    }
}

fn recompute_roster_totals(roster: &mut Roster, blocks: &BTreeMap<&str, &Block>, config: &SolverConfig) {
    roster.total_work_minutes = roster
        .block_ids
        .iter()
        .filter_map(|id| blocks.get(id.as_str()))
        .map(|b| b.work_min)
        .sum();
    roster.fte_class = if roster.total_work_minutes >= config.fte_target_band_min {
        FteClass::Fte
    } else if roster.total_work_minutes >= config.core_pt_target_band_min {
        FteClass::CorePt
    } else {
        FteClass::FlexPt
    };
}
