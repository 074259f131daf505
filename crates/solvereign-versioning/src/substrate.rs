use std::collections::BTreeMap;

use solvereign_core::{Assignment, AuditRecord, ForecastVersion, PlanStatus, PlanVersion};

use crate::error::VersioningError;
use crate::lifecycle;

/// Contract a durable store must satisfy. `InMemorySubstrate` below is a
/// complete, single-process reference implementation; a production
/// deployment swaps in a database-backed implementation of this same trait.
pub trait PersistenceSubstrate {
    fn insert_forecast(&mut self, forecast: ForecastVersion);
    fn insert_plan(&mut self, plan: PlanVersion);
    fn get_plan(&self, plan_id: &str) -> Option<&PlanVersion>;
    fn get_forecast(&self, forecast_id: &str) -> Option<&ForecastVersion>;

    /// Inserts all assignments atomically: either every assignment is
    /// recorded or none are.
    fn assignments_batch_insert(
        &mut self,
        plan_id: &str,
        assignments: Vec<Assignment>,
    ) -> Result<(), VersioningError>;

    /// Appends audit records; never removes or mutates existing ones.
    fn append_audit_records(&mut self, records: Vec<AuditRecord>);

    fn audit_trail(&self, plan_id: &str) -> Vec<&AuditRecord>;

    /// Transitions `plan_id` to `next`, enforcing that LOCKED plans accept
    /// only the LOCKED -> SUPERSEDED transition (append-only audit records
    /// are still accepted post-lock).
    fn transition_plan(&mut self, plan_id: &str, next: PlanStatus) -> Result<(), VersioningError>;

    /// Transitions `old_plan_id` to SUPERSEDED and records `new_plan_id` as
    /// its successor. Requires `new_plan_id` to already exist.
    fn mark_superseded(
        &mut self,
        old_plan_id: &str,
        new_plan_id: &str,
    ) -> Result<(), VersioningError>;

    /// Marks every DRAFT/AUDITED plan whose forecast is no longer READY as
    /// FAILED, since a later forecast revision makes them stale.
    fn stale_plan_sweep(&mut self) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct InMemorySubstrate {
    forecasts: BTreeMap<String, ForecastVersion>,
    plans: BTreeMap<String, PlanVersion>,
    assignments: BTreeMap<String, Vec<Assignment>>,
    audit_log: BTreeMap<String, Vec<AuditRecord>>,
}

impl InMemorySubstrate {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceSubstrate for InMemorySubstrate {
    fn insert_forecast(&mut self, forecast: ForecastVersion) {
        self.forecasts.insert(forecast.forecast_id.clone(), forecast);
    }

    fn insert_plan(&mut self, plan: PlanVersion) {
        self.plans.insert(plan.plan_id.clone(), plan);
    }

    fn get_plan(&self, plan_id: &str) -> Option<&PlanVersion> {
        self.plans.get(plan_id)
    }

    fn get_forecast(&self, forecast_id: &str) -> Option<&ForecastVersion> {
        self.forecasts.get(forecast_id)
    }

    fn assignments_batch_insert(
        &mut self,
        plan_id: &str,
        assignments: Vec<Assignment>,
    ) -> Result<(), VersioningError> {
        let plan = self
            .plans
            .get(plan_id)
            .ok_or_else(|| VersioningError::PlanNotFound {
                plan_id: plan_id.to_string(),
            })?;
        if plan.status == PlanStatus::Locked {
            return Err(VersioningError::PlanLocked {
                plan_id: plan_id.to_string(),
            });
        }
        self.assignments.insert(plan_id.to_string(), assignments);
        Ok(())
    }

    fn append_audit_records(&mut self, records: Vec<AuditRecord>) {
        for record in records {
            self.audit_log
                .entry(record.plan_id.clone())
                .or_default()
                .push(record);
        }
    }

    fn audit_trail(&self, plan_id: &str) -> Vec<&AuditRecord> {
        self.audit_log
            .get(plan_id)
            .map(|records| records.iter().collect())
            .unwrap_or_default()
    }

    fn transition_plan(&mut self, plan_id: &str, next: PlanStatus) -> Result<(), VersioningError> {
        let plan = self
            .plans
            .get_mut(plan_id)
            .ok_or_else(|| VersioningError::PlanNotFound {
                plan_id: plan_id.to_string(),
            })?;
        lifecycle::transition_plan(plan, next)
    }

    fn mark_superseded(
        &mut self,
        old_plan_id: &str,
        new_plan_id: &str,
    ) -> Result<(), VersioningError> {
        if !self.plans.contains_key(new_plan_id) {
            return Err(VersioningError::PlanNotFound {
                plan_id: new_plan_id.to_string(),
            });
        }
        let plan = self
            .plans
            .get_mut(old_plan_id)
            .ok_or_else(|| VersioningError::PlanNotFound {
                plan_id: old_plan_id.to_string(),
            })?;
        lifecycle::transition_plan(plan, PlanStatus::Superseded)?;
        plan.superseded_by = Some(new_plan_id.to_string());
        Ok(())
    }

    fn stale_plan_sweep(&mut self) -> Vec<String> {
        let forecasts = &self.forecasts;
        let mut swept = Vec::new();
        for (plan_id, plan) in self.plans.iter_mut() {
            if !matches!(plan.status, PlanStatus::Draft | PlanStatus::Audited) {
                continue;
            }
            let forecast_ready = forecasts
                .get(&plan.forecast_id)
                .map(|f| f.status == solvereign_core::ForecastStatus::Ready)
                .unwrap_or(false);
            if !forecast_ready && lifecycle::transition_plan(plan, PlanStatus::Failed).is_ok() {
                swept.push(plan_id.clone());
            }
        }
        swept
    }
}

/// Marks `old_plan_id` SUPERSEDED by `new_plan_id`. Per the explicit
/// acknowledgement requirement, nothing in the core pipeline calls this
/// automatically; a caller (the CLI, or an external operator) must invoke
/// it deliberately.
pub fn acknowledge_supersede(
    substrate: &mut dyn PersistenceSubstrate,
    old_plan_id: &str,
    new_plan_id: &str,
) -> Result<(), VersioningError> {
    substrate.mark_superseded(old_plan_id, new_plan_id)
}
