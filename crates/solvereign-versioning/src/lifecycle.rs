use solvereign_core::{ForecastStatus, ForecastVersion, PlanStatus, PlanVersion};

use crate::error::VersioningError;

/// Applies a forecast status transition, rejecting anything the monotone
/// lifecycle (PENDING -> READY | FAILED) does not allow.
pub fn transition_forecast(
    forecast: &mut ForecastVersion,
    next: ForecastStatus,
) -> Result<(), VersioningError> {
    if !forecast.status.can_transition_to(next) {
        return Err(VersioningError::IllegalForecastTransition {
            from: forecast.status,
            to: next,
        });
    }
    forecast.status = next;
    Ok(())
}

/// Applies a plan status transition, rejecting anything the monotone
/// lifecycle (SOLVING -> DRAFT -> AUDITED -> LOCKED -> SUPERSEDED, with
/// FAILED reachable from SOLVING/DRAFT/AUDITED) does not allow.
pub fn transition_plan(plan: &mut PlanVersion, next: PlanStatus) -> Result<(), VersioningError> {
    if !plan.status.can_transition_to(next) {
        return Err(VersioningError::IllegalPlanTransition {
            from: plan.status,
            to: next,
        });
    }
    plan.status = next;
    Ok(())
}
