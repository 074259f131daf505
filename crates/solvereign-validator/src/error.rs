use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("audit failed: {failed_checks} of {total_checks} checks did not pass")]
    AuditFailure {
        failed_checks: usize,
        total_checks: usize,
    },

    #[error("repair exhausted its operation budget of {budget} without reaching a passing audit")]
    RepairExhausted { budget: u32 },
}
