pub mod checks;
pub mod error;
pub mod repair;
pub mod report;

pub use error::ValidationError;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use solvereign_config::SolverConfig;
use solvereign_core::{Assignment, AuditRecord, Block, Roster, TourInstance};

/// Runs the full audit, attempting bounded repair if any check fails, and
/// returns the final roster set plus the append-only audit trail.
pub fn audit_and_repair(
    instances: &[TourInstance],
    blocks: &[Block],
    rosters: Vec<Roster>,
    roster_pool_by_id: &BTreeMap<String, Roster>,
    assignments_from: impl Fn(&[Roster]) -> Vec<Assignment>,
    config: &SolverConfig,
    plan_id: &str,
    now: NaiveDateTime,
) -> Result<(Vec<Roster>, Vec<AuditRecord>), ValidationError> {
    let assignments = assignments_from(&rosters);
    let outcomes = checks::run_all(instances, blocks, &rosters, &assignments, config);

    if report::all_passed(&outcomes) {
        let records = report::build_audit_records(plan_id, &outcomes, 0, now);
        return Ok((rosters, records));
    }

    let repaired = repair::repair(rosters, roster_pool_by_id, blocks, config, config.n_repair_ops)?;
    let repaired_assignments = assignments_from(&repaired);
    let final_outcomes = checks::run_all(instances, blocks, &repaired, &repaired_assignments, config);
    let records = report::build_audit_records(plan_id, &final_outcomes, 0, now);

    if report::all_passed(&final_outcomes) {
        Ok((repaired, records))
    } else {
        Err(ValidationError::AuditFailure {
            failed_checks: report::failed_count(&final_outcomes),
            total_checks: final_outcomes.len(),
        })
    }
}
