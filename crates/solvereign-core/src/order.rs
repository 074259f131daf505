use std::collections::BTreeMap;

use crate::model::{Block, Roster, TourInstance};

/// Sorts instances by their deterministic sort key in place.
pub fn sort_instances(instances: &mut [TourInstance]) {
    instances.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Sorts blocks by their tie-break key in place.
pub fn sort_blocks(blocks: &mut [Block]) {
    blocks.sort_by(|a, b| a.tie_break_key().cmp(&b.tie_break_key()));
}

/// Sorts rosters by `(fte_class, -total_work_minutes, fingerprint)`, the RMP
/// tie-break order.
pub fn sort_rosters(rosters: &mut [Roster]) {
    rosters.sort_by(|a, b| {
        a.fte_class
            .cmp(&b.fte_class)
            .then_with(|| b.total_work_minutes.cmp(&a.total_work_minutes))
            .then_with(|| a.fingerprint().cmp(&b.fingerprint()))
    });
}

/// Groups instances into a `BTreeMap` keyed by a caller-supplied key
/// function, so downstream iteration is always in sorted-key order.
pub fn group_by<K, T, F>(items: Vec<T>, key_fn: F) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut map: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        map.entry(key_fn(&item)).or_default().push(item);
    }
    map
}
