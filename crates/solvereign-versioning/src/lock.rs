use chrono::NaiveDateTime;
use solvereign_core::{PlanStatus, PlanVersion};

use crate::error::VersioningError;
use crate::lifecycle;

/// Locks an AUDITED plan, stamping `locked_at` and rejecting anything not
/// already AUDITED. Once locked, no field but `status`/`superseded_by` may
/// ever change again.
pub fn lock(plan: &mut PlanVersion, now: NaiveDateTime) -> Result<(), VersioningError> {
    lifecycle::transition_plan(plan, PlanStatus::Locked)?;
    plan.locked_at = Some(now);
    Ok(())
}

/// Returns an error if `plan` is LOCKED; callers use this to guard any
/// mutation of plan-scoped data (assignments, blocks, rosters) outside the
/// append-only audit log, which remains writable post-lock.
pub fn enforce_locked_immutability(plan: &PlanVersion) -> Result<(), VersioningError> {
    if plan.status == PlanStatus::Locked {
        return Err(VersioningError::PlanLocked {
            plan_id: plan.plan_id.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn plan(status: PlanStatus) -> PlanVersion {
        PlanVersion {
            plan_id: "P1".into(),
            forecast_id: "F1".into(),
            status,
            solver_config_hash: "hash".into(),
            output_hash: Some("out".into()),
            created_at: NaiveDate::from_ymd_opt(2026, 8, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            locked_at: None,
            superseded_by: None,
        }
    }

    #[test]
    fn locking_an_audited_plan_stamps_locked_at() {
        let mut p = plan(PlanStatus::Audited);
        let now = NaiveDate::from_ymd_opt(2026, 8, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        lock(&mut p, now).unwrap();
        assert_eq!(p.status, PlanStatus::Locked);
        assert_eq!(p.locked_at, Some(now));
    }

    #[test]
    fn locking_a_draft_plan_fails() {
        let mut p = plan(PlanStatus::Draft);
        let now = p.created_at;
        assert!(lock(&mut p, now).is_err());
    }

    #[test]
    fn locked_plan_rejects_further_mutation() {
        let p = plan(PlanStatus::Locked);
        assert!(enforce_locked_immutability(&p).is_err());
    }
}
