use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersioningError {
    #[error("illegal forecast status transition {from:?} -> {to:?}")]
    IllegalForecastTransition {
        from: solvereign_core::ForecastStatus,
        to: solvereign_core::ForecastStatus,
    },

    #[error("illegal plan status transition {from:?} -> {to:?}")]
    IllegalPlanTransition {
        from: solvereign_core::PlanStatus,
        to: solvereign_core::PlanStatus,
    },

    #[error("plan {plan_id} is locked and cannot be mutated")]
    PlanLocked { plan_id: String },

    #[error("plan {plan_id} was not found")]
    PlanNotFound { plan_id: String },

    #[error("forecast {forecast_id} was not found")]
    ForecastNotFound { forecast_id: String },

    #[error("supersede of {old_plan_id} by {new_plan_id} was not acknowledged")]
    SupersedeNotAcknowledged {
        old_plan_id: String,
        new_plan_id: String,
    },
}
