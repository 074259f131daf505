use chrono::NaiveDateTime;
use solvereign_core::AuditRecord;

use crate::checks::CheckOutcome;

/// Stamps each check outcome into a sequential, append-only `AuditRecord`
/// list for `plan_id`.
pub fn build_audit_records(
    plan_id: &str,
    outcomes: &[CheckOutcome],
    starting_seq: u64,
    created_at: NaiveDateTime,
) -> Vec<AuditRecord> {
    outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| AuditRecord {
            record_id: format!("{}-AUDIT-{:04}", plan_id, starting_seq + i as u64),
            plan_id: plan_id.to_string(),
            seq: starting_seq + i as u64,
            check_id: outcome.check_id.to_string(),
            passed: outcome.passed,
            message: outcome.message.clone(),
            counters: outcome.counters.clone(),
            created_at,
        })
        .collect()
}

pub fn all_passed(outcomes: &[CheckOutcome]) -> bool {
    outcomes.iter().all(|o| o.passed)
}

pub fn failed_count(outcomes: &[CheckOutcome]) -> usize {
    outcomes.iter().filter(|o| !o.passed).count()
}
