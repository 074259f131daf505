use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("week_anchor_date {0} is not a Monday")]
    NotAMonday(chrono::NaiveDate),

    #[error("no feasible block could be built for instance {instance_id}")]
    InfeasibleBlock { instance_id: String },

    #[error("solver exceeded its iteration budget without reaching coverage")]
    SolverTimeout,

    #[error("no feasible roster assignment exists for the given blocks")]
    SolverInfeasible,
}
