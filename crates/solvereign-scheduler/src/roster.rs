use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use solvereign_config::SolverConfig;
use solvereign_core::{order, Block, BlockType, FteClass, Roster};

/// Generates a pool of candidate rosters from a week's blocks: one singleton
/// roster per block (the guaranteed-feasible fallback, so the RMP always has
/// a feasible basis) plus a bounded number of multi-block rosters assembled
/// with a seeded PRNG, targeting the configured FTE hour bands.
pub fn generate(blocks: &[Block], config: &SolverConfig) -> Vec<Roster> {
    let mut rosters = Vec::new();

    for block in blocks {
        rosters.push(Roster {
            roster_id: format!("R-SINGLE-{}", block.block_id),
            driver_label: format!("singleton::{}", block.block_id),
            fte_class: classify(block.work_min, config),
            block_ids: vec![block.block_id.clone()],
            total_work_minutes: block.work_min,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let attempts = (blocks.len() as u32 * 4).max(1);

    for attempt in 0..attempts {
        let mut order_of_blocks: Vec<&Block> = blocks.iter().collect();
        order_of_blocks.shuffle(&mut rng);

        let mut chosen: Vec<&Block> = Vec::new();
        let mut used_dates = std::collections::BTreeSet::new();
        let mut total_minutes: u32 = 0;

        for block in order_of_blocks {
            if used_dates.contains(&block.date) {
                continue;
            }
            if rests_ok(&chosen, block, config) && fatigue_ok(&chosen, block) {
                total_minutes += block.work_min;
                used_dates.insert(block.date);
                chosen.push(block);
                if total_minutes >= config.fte_target_band_min {
                    break;
                }
            }
        }

        if chosen.len() < 2 || total_minutes == 0 {
            continue;
        }

        let mut block_ids: Vec<String> = chosen.iter().map(|b| b.block_id.clone()).collect();
        block_ids.sort();

        rosters.push(Roster {
            roster_id: format!("R-GEN-{:04}", attempt),
            driver_label: format!("generated::{:04}", attempt),
            fte_class: classify(total_minutes, config),
            block_ids,
            total_work_minutes: total_minutes,
        });
    }

    order::sort_rosters(&mut rosters);
    rosters.dedup_by(|a, b| a.fingerprint() == b.fingerprint());
    rosters
}

/// Checks that inserting `candidate` leaves at least `min_rest_min` between
/// it and every already-chosen block, regardless of which comes first.
fn rests_ok(chosen: &[&Block], candidate: &Block, config: &SolverConfig) -> bool {
    chosen.iter().all(|existing| {
        let gap_minutes = if candidate.start >= existing.end {
            (candidate.start - existing.end).num_minutes()
        } else if existing.start >= candidate.end {
            (existing.start - candidate.end).num_minutes()
        } else {
            return false; // overlapping blocks are never acceptable
        };
        gap_minutes >= config.min_rest_min as i64
    })
}

/// No driver works THREE_CHAIN blocks on two consecutive calendar days.
fn fatigue_ok(chosen: &[&Block], candidate: &Block) -> bool {
    if candidate.block_type != BlockType::ThreeChain {
        return true;
    }
    !chosen.iter().any(|existing| {
        existing.block_type == BlockType::ThreeChain
            && (existing.date - candidate.date).num_days().abs() == 1
    })
}

fn classify(total_minutes: u32, config: &SolverConfig) -> FteClass {
    if total_minutes >= config.fte_target_band_min {
        FteClass::Fte
    } else if total_minutes >= config.core_pt_target_band_min {
        FteClass::CorePt
    } else {
        FteClass::FlexPt
    }
}
