use std::collections::BTreeSet;

use solvereign_config::SolverConfig;
use solvereign_core::{order, Block, BlockType, TourInstance};

/// Enumerates every feasible block (ONE, TWO_REG, TWO_SPLIT, THREE_CHAIN).
/// Instances are sorted once, globally, and windowed directly — not grouped
/// by calendar day first — so a late-evening instance on one day can chain
/// with an early-morning instance on the next (cross-midnight blocks are
/// anchored by their first instance's date). Candidates are capped at
/// `max_blocks_per_day` per anchor date by taking the highest
/// tie-break-priority candidates once sorted.
pub fn build_blocks(instances: &[TourInstance], config: &SolverConfig) -> Vec<Block> {
    let mut sorted: Vec<&TourInstance> = instances.iter().collect();
    sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut blocks: Vec<Block> = sorted.iter().map(|i| singleton_block(i)).collect();

    for window in sorted.windows(2) {
        let (a, b) = (window[0], window[1]);
        let gap = match gap_minutes(a, b) {
            Some(g) => g,
            None => continue, // overlapping instances cannot share a driver
        };
        if gap >= config.triple_gap_min && gap <= config.triple_gap_max {
            if let Some(block) = pair_block(a, b, BlockType::TwoReg, config.span_regular_max_min) {
                blocks.push(block);
            }
        } else if gap >= config.split_break_min && gap <= config.split_break_max {
            if let Some(block) = pair_block(a, b, BlockType::TwoSplit, config.three_chain_span_max_min) {
                blocks.push(block);
            }
        }
    }

    for window in sorted.windows(3) {
        let (a, b, c) = (window[0], window[1], window[2]);
        let (gap1, gap2) = match (gap_minutes(a, b), gap_minutes(b, c)) {
            (Some(g1), Some(g2)) => (g1, g2),
            _ => continue,
        };
        if gap1 >= config.triple_gap_min
            && gap1 <= config.triple_gap_max
            && gap2 >= config.triple_gap_min
            && gap2 <= config.triple_gap_max
        {
            if let Some(block) = triple_block(a, b, c, config.three_chain_span_max_min) {
                blocks.push(block);
            }
        }
    }

    let dates: BTreeSet<_> = blocks.iter().map(|b| b.date).collect();
    let mut result = Vec::new();
    for date in dates {
        let mut per_date: Vec<Block> = blocks.iter().filter(|b| b.date == date).cloned().collect();
        order::sort_blocks(&mut per_date);
        let day_instance_count = sorted.iter().filter(|i| i.start.date() == date).count().max(1);
        per_date.truncate(config.max_blocks_per_day as usize * day_instance_count);
        result.extend(per_date);
    }

    order::sort_blocks(&mut result);
    result
}

/// Minutes between `a`'s end and `b`'s start, or `None` if they overlap
/// (no driver can work two instances at once).
fn gap_minutes(a: &TourInstance, b: &TourInstance) -> Option<u32> {
    let minutes = (b.start - a.end).num_minutes();
    if minutes < 0 {
        None
    } else {
        Some(minutes as u32)
    }
}

fn span_minutes(first: &TourInstance, last: &TourInstance) -> u32 {
    (last.end - first.start).num_minutes().max(0) as u32
}

fn singleton_block(instance: &TourInstance) -> Block {
    let work = (instance.end - instance.start).num_minutes() as u32;
    Block {
        block_id: format!("B-ONE-{}", instance.instance_id),
        block_type: BlockType::One,
        instance_ids: vec![instance.instance_id.clone()],
        span_min: work,
        work_min: work,
        date: instance.start.date(),
        start: instance.start,
        end: instance.end,
    }
}

fn pair_block(a: &TourInstance, b: &TourInstance, block_type: BlockType, span_cap: u32) -> Option<Block> {
    let span = span_minutes(a, b);
    if span > span_cap {
        return None;
    }
    let work = (a.end - a.start).num_minutes() as u32 + (b.end - b.start).num_minutes() as u32;
    Some(Block {
        block_id: format!("B-{:?}-{}-{}", block_type, a.instance_id, b.instance_id),
        block_type,
        instance_ids: vec![a.instance_id.clone(), b.instance_id.clone()],
        span_min: span,
        work_min: work,
        date: a.start.date(),
        start: a.start,
        end: b.end,
    })
}

fn triple_block(a: &TourInstance, b: &TourInstance, c: &TourInstance, span_cap: u32) -> Option<Block> {
    let span = span_minutes(a, c);
    if span > span_cap {
        return None;
    }
    let work = (a.end - a.start).num_minutes() as u32
        + (b.end - b.start).num_minutes() as u32
        + (c.end - c.start).num_minutes() as u32;
    Some(Block {
        block_id: format!(
            "B-THREE_CHAIN-{}-{}-{}",
            a.instance_id, b.instance_id, c.instance_id
        ),
        block_type: BlockType::ThreeChain,
        instance_ids: vec![
            a.instance_id.clone(),
            b.instance_id.clone(),
            c.instance_id.clone(),
        ],
        span_min: span,
        work_min: work,
        date: a.start.date(),
        start: a.start,
        end: c.end,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime};
    use proptest::prelude::*;

    fn instance_at(id: &str, date: NaiveDate, start_min: i64, duration_min: i64) -> TourInstance {
        let midnight = date.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let start = midnight + Duration::minutes(start_min);
        TourInstance {
            instance_id: id.to_string(),
            template_id: id.to_string(),
            instance_no: 1,
            date,
            start,
            end: start + Duration::minutes(duration_min),
            crosses_midnight: false,
            depot: Some("D1".into()),
            skill: Some("STD".into()),
        }
    }

    proptest! {
        /// Block taxonomy invariant: no produced TWO_REG/TWO_SPLIT/THREE_CHAIN
        /// block ever joins two instances whose raw time ranges overlap.
        #[test]
        fn no_block_ever_joins_overlapping_instances(
            start_a in 0i64..1440,
            dur_a in 30i64..600,
            start_b in 0i64..1440,
            dur_b in 30i64..600,
        ) {
            let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
            let instances = vec![
                instance_at("I1", date, start_a, dur_a),
                instance_at("I2", date, start_b, dur_b),
            ];
            let blocks = build_blocks(&instances, &SolverConfig::default());

            for block in &blocks {
                if block.instance_ids.len() < 2 {
                    continue;
                }
                let members: Vec<&TourInstance> = block
                    .instance_ids
                    .iter()
                    .filter_map(|id| instances.iter().find(|i| &i.instance_id == id))
                    .collect();
                let mut sorted = members.clone();
                sorted.sort_by_key(|i| i.start);
                for window in sorted.windows(2) {
                    prop_assert!(window[1].start >= window[0].end);
                }
            }
        }

        /// No TWO_REG block ever exceeds the regular span cap, and no
        /// TWO_SPLIT/THREE_CHAIN block ever exceeds the extended span cap.
        #[test]
        fn no_block_ever_exceeds_its_span_cap(
            start_a in 0i64..1440,
            dur_a in 30i64..600,
            gap in 0i64..500,
            dur_b in 30i64..600,
        ) {
            let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
            let b_start = start_a + dur_a + gap;
            let instances = vec![
                instance_at("I1", date, start_a, dur_a),
                instance_at("I2", date, b_start, dur_b),
            ];
            let config = SolverConfig::default();
            let blocks = build_blocks(&instances, &config);

            for block in &blocks {
                match block.block_type {
                    BlockType::TwoReg => prop_assert!(block.span_min <= config.span_regular_max_min),
                    BlockType::TwoSplit | BlockType::ThreeChain => {
                        prop_assert!(block.span_min <= config.three_chain_span_max_min)
                    }
                    BlockType::One => {}
                }
            }
        }
    }
}
