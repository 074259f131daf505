use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use solvereign_config::SolverConfig;
use solvereign_core::{Baseline, Block, FteClass, Roster, TourInstance};

use crate::error::SchedulerError;

/// Result of solving the restricted master problem: the chosen rosters and
/// any instances that could not be covered (`u_t` slack).
#[derive(Debug, Clone)]
pub struct RmpSolution {
    pub selected_roster_ids: Vec<String>,
    pub uncovered_instance_ids: Vec<String>,
    pub objective: f64,
    pub rounds: u32,
}

/// Selects a subset of `rosters` covering as many `instances` as possible at
/// minimum weighted cost. Below `exact_solve_threshold` instances this runs
/// an exact branch-and-bound search; above it, a deterministic greedy loop
/// with gap-driven pool re-scan, stopping after `stall_rounds_limit`
/// consecutive rounds with no improvement.
///
/// When `baseline` is given, every instance starting within
/// `config.freeze_window_minutes` of `now` has its RMP variable fixed to the
/// roster holding the baseline's block for that instance (its pre-generated
/// singleton, since block ids are stable across runs for the same
/// instances). Those rosters are pinned into the solution before the solver
/// runs, and their covered instances are removed from the pool it optimizes
/// over.
pub fn solve(
    instances: &[TourInstance],
    blocks: &[Block],
    rosters: &[Roster],
    config: &SolverConfig,
    now: NaiveDateTime,
    baseline: Option<&Baseline>,
) -> Result<RmpSolution, SchedulerError> {
    let block_instances: BTreeMap<&str, &[String]> = blocks
        .iter()
        .map(|b| (b.block_id.as_str(), b.instance_ids.as_slice()))
        .collect();

    let roster_coverage: BTreeMap<&str, BTreeSet<String>> = rosters
        .iter()
        .map(|r| {
            let mut covered = BTreeSet::new();
            for block_id in &r.block_ids {
                if let Some(ids) = block_instances.get(block_id.as_str()) {
                    covered.extend(ids.iter().cloned());
                }
            }
            (r.roster_id.as_str(), covered)
        })
        .collect();

    let all_instance_ids: BTreeSet<String> =
        instances.iter().map(|i| i.instance_id.clone()).collect();

    let rosters_by_id: BTreeMap<&str, &Roster> =
        rosters.iter().map(|r| (r.roster_id.as_str(), r)).collect();

    let pinned = pinned_rosters(instances, config, now, baseline, &rosters_by_id);
    let mut pinned_ids: BTreeSet<String> = pinned.iter().map(|r| r.roster_id.clone()).collect();

    let mut remaining_instance_ids = all_instance_ids.clone();
    for roster_id in &pinned_ids {
        if let Some(covered) = roster_coverage.get(roster_id.as_str()) {
            for id in covered {
                remaining_instance_ids.remove(id);
            }
        }
    }

    let free_rosters: Vec<Roster> = rosters
        .iter()
        .filter(|r| !pinned_ids.contains(&r.roster_id))
        .cloned()
        .collect();

    let mut solution = if remaining_instance_ids.len() <= config.exact_solve_threshold {
        exact_solve(&remaining_instance_ids, &free_rosters, &roster_coverage, config)
    } else {
        greedy_solve(&remaining_instance_ids, &free_rosters, &roster_coverage, config)
    };

    solution.objective += objective(&pinned, 0, config);
    pinned_ids.extend(solution.selected_roster_ids.drain(..));
    solution.selected_roster_ids = pinned_ids.into_iter().collect();
    Ok(solution)
}

/// The rosters required by the freeze window: one per distinct baseline
/// block covering a frozen instance, resolved to whatever roster in the
/// current pool holds that exact block (preferring an exact `roster_id`
/// carry-over, falling back to the block's singleton roster).
fn pinned_rosters<'a>(
    instances: &[TourInstance],
    config: &SolverConfig,
    now: NaiveDateTime,
    baseline: Option<&Baseline>,
    rosters_by_id: &BTreeMap<&str, &'a Roster>,
) -> Vec<&'a Roster> {
    let baseline = match baseline {
        Some(b) => b,
        None => return Vec::new(),
    };

    let freeze_cutoff = now + chrono::Duration::minutes(config.freeze_window_minutes as i64);
    let frozen_instance_ids: BTreeSet<&str> = instances
        .iter()
        .filter(|i| i.start <= freeze_cutoff)
        .map(|i| i.instance_id.as_str())
        .collect();

    let mut required_block_ids: BTreeSet<&str> = BTreeSet::new();
    for (instance_id, block_id) in &baseline.instance_block {
        if frozen_instance_ids.contains(instance_id.as_str()) {
            required_block_ids.insert(block_id.as_str());
        }
    }

    let mut pinned = Vec::new();
    for block_id in required_block_ids {
        let singleton_id = format!("R-SINGLE-{}", block_id);
        if let Some(roster) = rosters_by_id.get(singleton_id.as_str()) {
            pinned.push(*roster);
        }
    }
    pinned
}

/// `W_UNDER*sum(u_t) + PT_BASE*sum(x_r : r is PT) + FTE_BASE*sum(x_r : r is
/// FTE) + DEV*sum(dev(r))`, where `dev(r) = (hours(r) - 47.5)^2` penalizes
/// every selected roster's deviation from the 47.5h target band regardless
/// of its FTE class.
fn objective(selected: &[&Roster], uncovered: usize, config: &SolverConfig) -> f64 {
    let mut pt_count = 0u32;
    let mut fte_count = 0u32;
    let mut dev_sum = 0.0f64;

    for roster in selected {
        match roster.fte_class {
            FteClass::Fte => fte_count += 1,
            FteClass::CorePt | FteClass::FlexPt => pt_count += 1,
        }
        dev_sum += dev(roster);
    }

    config.w_under * uncovered as f64
        + config.pt_base * pt_count as f64
        + config.fte_base * fte_count as f64
        + config.dev_weight * dev_sum
}

/// Squared deviation, in hours, from the 47.5h weekly target band.
fn dev(roster: &Roster) -> f64 {
    let hours = roster.total_work_minutes as f64 / 60.0;
    (hours - 47.5).powi(2)
}

/// The marginal objective cost of adding `roster` to the selected set,
/// excluding the `W_UNDER` term (which depends on what remains uncovered,
/// not on the roster itself). Used by the greedy solver to rank candidates
/// by newly-covered-instances per unit cost.
fn roster_cost(roster: &Roster, config: &SolverConfig) -> f64 {
    let base = match roster.fte_class {
        FteClass::Fte => config.fte_base,
        FteClass::CorePt | FteClass::FlexPt => config.pt_base,
    };
    (base + config.dev_weight * dev(roster)).max(1.0)
}

/// Deterministic branch-and-bound exact search: at each step, pick the
/// lowest-id uncovered instance and branch over every roster (sorted by
/// `roster_id`) that covers it, pruning branches whose partial objective
/// already exceeds the best found so far.
fn exact_solve(
    all_instance_ids: &BTreeSet<String>,
    rosters: &[Roster],
    roster_coverage: &BTreeMap<&str, BTreeSet<String>>,
    config: &SolverConfig,
) -> RmpSolution {
    let mut best: Option<(Vec<String>, BTreeSet<String>, f64)> = None;
    let mut rounds: u32 = 0;

    let mut candidate_order: Vec<&Roster> = rosters.iter().collect();
    candidate_order.sort_by(|a, b| a.roster_id.cmp(&b.roster_id));

    fn recurse<'a>(
        remaining: BTreeSet<String>,
        chosen: Vec<&'a Roster>,
        candidates: &[&'a Roster],
        roster_coverage: &BTreeMap<&str, BTreeSet<String>>,
        config: &SolverConfig,
        best: &mut Option<(Vec<String>, BTreeSet<String>, f64)>,
        rounds: &mut u32,
    ) {
        *rounds += 1;
        let current_obj = objective(&chosen, remaining.len(), config);
        if let Some((_, _, best_obj)) = best {
            if current_obj >= *best_obj {
                return;
            }
        }

        if remaining.is_empty() || *rounds as usize > 20_000 {
            let ids: Vec<String> = chosen.iter().map(|r| r.roster_id.clone()).collect();
            *best = Some((ids, remaining, current_obj));
            return;
        }

        let target = remaining.iter().next().cloned().unwrap();
        let covering: Vec<&'a Roster> = candidates
            .iter()
            .filter(|r| {
                roster_coverage
                    .get(r.roster_id.as_str())
                    .map(|c| c.contains(&target))
                    .unwrap_or(false)
            })
            .copied()
            .collect();

        if covering.is_empty() {
            let mut next_remaining = remaining.clone();
            next_remaining.remove(&target);
            recurse(
                next_remaining,
                chosen.clone(),
                candidates,
                roster_coverage,
                config,
                best,
                rounds,
            );
            return;
        }

        for roster in covering {
            let covered = roster_coverage.get(roster.roster_id.as_str()).unwrap();
            let mut next_remaining = remaining.clone();
            for id in covered {
                next_remaining.remove(id);
            }
            let mut next_chosen = chosen.clone();
            next_chosen.push(roster);
            recurse(
                next_remaining,
                next_chosen,
                candidates,
                roster_coverage,
                config,
                best,
                rounds,
            );
        }
    }

    recurse(
        all_instance_ids.clone(),
        Vec::new(),
        &candidate_order,
        roster_coverage,
        config,
        &mut best,
        &mut rounds,
    );

    let (selected_roster_ids, uncovered, objective_value) = best.unwrap_or_else(|| {
        (Vec::new(), all_instance_ids.clone(), f64::INFINITY)
    });

    RmpSolution {
        selected_roster_ids,
        uncovered_instance_ids: uncovered.into_iter().collect(),
        objective: objective_value,
        rounds,
    }
}

/// Deterministic greedy set cover: repeatedly select the roster with the
/// best (newly-covered-instances / cost) ratio, breaking ties by
/// `roster_fingerprint`. Re-scans the full pool each round (the "gap-driven
/// pool expansion" of the column-generation analogue) and stops after
/// `stall_rounds_limit` consecutive rounds that cover nothing new.
fn greedy_solve(
    all_instance_ids: &BTreeSet<String>,
    rosters: &[Roster],
    roster_coverage: &BTreeMap<&str, BTreeSet<String>>,
    config: &SolverConfig,
) -> RmpSolution {
    let mut remaining: BTreeSet<String> = all_instance_ids.clone();
    let mut selected: Vec<&Roster> = Vec::new();
    let mut selected_ids: BTreeSet<&str> = BTreeSet::new();
    let mut stall_rounds = 0u32;
    let mut rounds = 0u32;

    while !remaining.is_empty() && stall_rounds < config.stall_rounds_limit {
        rounds += 1;
        let mut best_roster: Option<&Roster> = None;
        let mut best_score = f64::MIN;

        for roster in rosters {
            if selected_ids.contains(roster.roster_id.as_str()) {
                continue;
            }
            let covered = match roster_coverage.get(roster.roster_id.as_str()) {
                Some(c) => c,
                None => continue,
            };
            let newly_covered = covered.intersection(&remaining).count();
            if newly_covered == 0 {
                continue;
            }
            let score = newly_covered as f64 / roster_cost(roster, config);
            let is_better = score > best_score
                || (score == best_score
                    && best_roster
                        .map(|b| roster.fingerprint() < b.fingerprint())
                        .unwrap_or(true));
            if is_better {
                best_score = score;
                best_roster = Some(roster);
            }
        }

        match best_roster {
            Some(roster) => {
                let covered = roster_coverage.get(roster.roster_id.as_str()).unwrap();
                let before = remaining.len();
                for id in covered {
                    remaining.remove(id);
                }
                selected_ids.insert(roster.roster_id.as_str());
                selected.push(roster);
                if remaining.len() == before {
                    stall_rounds += 1;
                } else {
                    stall_rounds = 0;
                }
            }
            None => {
                stall_rounds += 1;
            }
        }
    }

    let objective_value = objective(&selected, remaining.len(), config);

    RmpSolution {
        selected_roster_ids: selected.iter().map(|r| r.roster_id.clone()).collect(),
        uncovered_instance_ids: remaining.into_iter().collect(),
        objective: objective_value,
        rounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use solvereign_core::{BlockType, FteClass};

    fn make_instance(id: &str, date: NaiveDate) -> TourInstance {
        let start = date.and_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        TourInstance {
            instance_id: id.to_string(),
            template_id: id.to_string(),
            instance_no: 1,
            date,
            start,
            end: start + chrono::Duration::hours(8),
            crosses_midnight: false,
            depot: Some("D1".into()),
            skill: Some("STD".into()),
        }
    }

    fn make_block(id: &str, instance_id: &str, date: NaiveDate) -> Block {
        Block {
            block_id: id.to_string(),
            block_type: BlockType::One,
            instance_ids: vec![instance_id.to_string()],
            span_min: 480,
            work_min: 480,
            date,
            start: date.and_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            end: date.and_time(NaiveTime::from_hms_opt(16, 0, 0).unwrap()),
        }
    }

    fn make_roster(id: &str, block_id: &str, work_min: u32) -> Roster {
        Roster {
            roster_id: id.to_string(),
            driver_label: id.to_string(),
            fte_class: FteClass::FlexPt,
            block_ids: vec![block_id.to_string()],
            total_work_minutes: work_min,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 3)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap())
    }

    #[test]
    fn exact_solve_covers_everything_when_feasible() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let instances = vec![make_instance("I1", date)];
        let blocks = vec![make_block("B1", "I1", date)];
        let rosters = vec![make_roster("R1", "B1", 480)];
        let config = SolverConfig::default();

        let solution = solve(&instances, &blocks, &rosters, &config, now(), None).unwrap();
        assert!(solution.uncovered_instance_ids.is_empty());
        assert_eq!(solution.selected_roster_ids, vec!["R1".to_string()]);
    }

    #[test]
    fn solve_is_deterministic() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let instances = vec![make_instance("I1", date), make_instance("I2", date)];
        let blocks = vec![
            make_block("B1", "I1", date),
            make_block("B2", "I2", date),
        ];
        let rosters = vec![
            make_roster("R1", "B1", 480),
            make_roster("R2", "B2", 480),
        ];
        let config = SolverConfig::default();

        let first = solve(&instances, &blocks, &rosters, &config, now(), None).unwrap();
        let second = solve(&instances, &blocks, &rosters, &config, now(), None).unwrap();
        assert_eq!(first.selected_roster_ids, second.selected_roster_ids);
        assert_eq!(first.uncovered_instance_ids, second.uncovered_instance_ids);
    }

    #[test]
    fn freeze_window_pins_the_baseline_singleton_for_a_near_term_instance() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let instances = vec![make_instance("I1", date), make_instance("I2", date)];
        let blocks = vec![
            make_block("B1", "I1", date),
            make_block("B2", "I2", date),
        ];
        let rosters = vec![
            Roster {
                roster_id: "R-SINGLE-B1".into(),
                driver_label: "singleton::B1".into(),
                fte_class: FteClass::FlexPt,
                block_ids: vec!["B1".into()],
                total_work_minutes: 480,
            },
            make_roster("R2", "B2", 480),
        ];
        let config = SolverConfig::default();

        let mut instance_block = BTreeMap::new();
        instance_block.insert("I1".to_string(), "B1".to_string());
        let baseline = solvereign_core::Baseline { instance_block };

        // I1 starts on 2026-08-03, well inside a freeze window anchored at `now()`.
        let solution = solve(&instances, &blocks, &rosters, &config, now(), Some(&baseline)).unwrap();
        assert!(solution.selected_roster_ids.contains(&"R-SINGLE-B1".to_string()));
        assert!(solution.uncovered_instance_ids.is_empty());
    }
}
