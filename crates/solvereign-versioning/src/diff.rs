use std::collections::{BTreeMap, BTreeSet};

use solvereign_core::{DiffResult, ForecastVersion};

/// Computes the set-difference between two forecasts' template fingerprints:
/// templates added, removed, or changed (same `template_id`, different
/// fingerprint) between `a` and `b`.
pub fn diff(a: &ForecastVersion, b: &ForecastVersion) -> DiffResult {
    let fp_a: BTreeMap<&str, String> = a
        .templates
        .iter()
        .map(|t| (t.template_id.as_str(), t.fingerprint()))
        .collect();
    let fp_b: BTreeMap<&str, String> = b
        .templates
        .iter()
        .map(|t| (t.template_id.as_str(), t.fingerprint()))
        .collect();

    let ids_a: BTreeSet<&str> = fp_a.keys().copied().collect();
    let ids_b: BTreeSet<&str> = fp_b.keys().copied().collect();

    let added_template_ids = ids_b.difference(&ids_a).map(|s| s.to_string()).collect();
    let removed_template_ids = ids_a.difference(&ids_b).map(|s| s.to_string()).collect();
    let changed_template_ids = ids_a
        .intersection(&ids_b)
        .filter(|id| fp_a.get(*id) != fp_b.get(*id))
        .map(|s| s.to_string())
        .collect();

    DiffResult {
        forecast_a_id: a.forecast_id.clone(),
        forecast_b_id: b.forecast_id.clone(),
        added_template_ids,
        removed_template_ids,
        changed_template_ids,
    }
}

/// A `BTreeMap`-backed cache keyed by `(forecast_a_id, forecast_b_id)`, so
/// repeated diffs between the same two forecasts are computed once.
#[derive(Debug, Default)]
pub struct DiffCache {
    entries: BTreeMap<(String, String), DiffResult>,
}

impl DiffCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, a: &ForecastVersion, b: &ForecastVersion) -> &DiffResult {
        let key = (a.forecast_id.clone(), b.forecast_id.clone());
        self.entries.entry(key).or_insert_with(|| diff(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use solvereign_core::{Day, ForecastStatus, TourTemplate};

    fn forecast(id: &str, templates: Vec<TourTemplate>) -> ForecastVersion {
        ForecastVersion {
            forecast_id: id.to_string(),
            week_anchor_date: NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
            status: ForecastStatus::Ready,
            raw_lines: vec![],
            input_hash: "h".into(),
            templates,
            created_at: NaiveDate::from_ymd_opt(2026, 8, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn template(id: &str, start_min: u32) -> TourTemplate {
        TourTemplate {
            template_id: id.to_string(),
            day: Day::Mon,
            start_min,
            end_min: start_min + 480,
            depot: Some("D1".into()),
            skill: Some("STD".into()),
            count: 1,
        }
    }

    #[test]
    fn detects_added_removed_and_changed() {
        let a = forecast("FA", vec![template("T1", 480), template("T2", 540)]);
        let b = forecast("FB", vec![template("T1", 600), template("T3", 540)]);

        let result = diff(&a, &b);
        assert_eq!(result.added_template_ids, vec!["T3".to_string()]);
        assert_eq!(result.removed_template_ids, vec!["T2".to_string()]);
        assert_eq!(result.changed_template_ids, vec!["T1".to_string()]);
    }
}
