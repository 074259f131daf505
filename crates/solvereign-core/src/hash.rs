use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Serializes `value` to JSON with map keys in sorted order and computes the
/// SHA-256 digest, hex-encoded. `serde_json` already emits struct fields in
/// declaration order and map keys from `BTreeMap` in sorted order, so callers
/// must route any `HashMap`-backed data through a `BTreeMap` before calling
/// this, per the sorted-iteration invariant.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, CoreError> {
    let bytes = serde_json::to_vec(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}

/// Hash of raw canonicalized forecast text, per the parser's `input_hash`.
pub fn input_hash(canonical_lines: &[String]) -> String {
    let mut hasher = Sha256::new();
    for line in canonical_lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_hash_is_deterministic() {
        let lines = vec!["a".to_string(), "b".to_string()];
        let h1 = input_hash(&lines);
        let h2 = input_hash(&lines);
        assert_eq!(h1, h2);
    }

    #[test]
    fn input_hash_distinguishes_order() {
        let forward = vec!["a".to_string(), "b".to_string()];
        let backward = vec!["b".to_string(), "a".to_string()];
        assert_ne!(input_hash(&forward), input_hash(&backward));
    }

    #[test]
    fn canonical_hash_is_deterministic_for_btreemap() {
        use std::collections::BTreeMap;
        let mut m1 = BTreeMap::new();
        m1.insert("z", 1);
        m1.insert("a", 2);
        let mut m2 = BTreeMap::new();
        m2.insert("a", 2);
        m2.insert("z", 1);
        assert_eq!(canonical_hash(&m1).unwrap(), canonical_hash(&m2).unwrap());
    }
}
