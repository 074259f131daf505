use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use solvereign_config::{ParserWhitelistConfig, SolverConfig};
use solvereign_core::{
    hash::canonical_hash, Assignment, AuditRecord, Baseline, Block, ForecastStatus,
    ForecastVersion, PlanKpis, PlanStatus, PlanVersion, Roster, TourInstance,
};

/// Everything produced by running the pipeline once, end to end.
pub struct PipelineOutput {
    pub forecast: ForecastVersion,
    pub plan: PlanVersion,
    pub instances: Vec<TourInstance>,
    pub blocks: Vec<Block>,
    pub rosters: Vec<Roster>,
    pub assignments: Vec<Assignment>,
    pub audit_records: Vec<AuditRecord>,
    pub kpis: PlanKpis,
}

/// Runs parse -> expand -> build blocks -> generate rosters -> solve RMP ->
/// audit/repair, producing a fully solved and audited `PlanVersion` (DRAFT
/// status if repair was needed beyond what the audit could pass, AUDITED if
/// clean). Does not lock the plan; callers decide when to call
/// `solvereign_versioning::lock::lock`.
///
/// `baseline`, when given, anchors the freeze window: instances starting
/// within `solver_config.freeze_window_minutes` of `now` keep whatever block
/// they held in the baseline plan.
pub fn run(
    raw_forecast: &str,
    week_anchor_date: NaiveDate,
    solver_config: &SolverConfig,
    whitelist: &ParserWhitelistConfig,
    forecast_id: &str,
    plan_id: &str,
    now: NaiveDateTime,
    baseline: Option<&Baseline>,
) -> anyhow::Result<PipelineOutput> {
    let parse_report = solvereign_parser::parse_forecast(raw_forecast, whitelist)?;

    let forecast = ForecastVersion {
        forecast_id: forecast_id.to_string(),
        week_anchor_date,
        // Partial-FAIL forecasts still expand on their PASS/WARN lines.
        status: ForecastStatus::Ready,
        raw_lines: parse_report.canonical_lines.clone(),
        input_hash: parse_report.input_hash.clone(),
        templates: parse_report.templates.clone(),
        created_at: now,
    };

    let instances = solvereign_scheduler::expander::expand(&forecast.templates, week_anchor_date)?;
    let blocks = solvereign_scheduler::block::build_blocks(&instances, solver_config);
    let rosters = solvereign_scheduler::roster::generate(&blocks, solver_config);

    let roster_pool_by_id: BTreeMap<String, Roster> = rosters
        .iter()
        .cloned()
        .map(|r| (r.roster_id.clone(), r))
        .collect();

    let rmp_solution = solvereign_scheduler::rmp::solve(
        &instances,
        &blocks,
        &rosters,
        solver_config,
        now,
        baseline,
    )?;

    let selected_rosters: Vec<Roster> = rmp_solution
        .selected_roster_ids
        .iter()
        .filter_map(|id| roster_pool_by_id.get(id).cloned())
        .collect();

    let blocks_for_assignments = blocks.clone();
    let assignments_from = move |rosters: &[Roster]| -> Vec<Assignment> {
        let blocks_by_id: BTreeMap<&str, &Block> = blocks_for_assignments
            .iter()
            .map(|b| (b.block_id.as_str(), b))
            .collect();
        let mut assignments = Vec::new();
        for roster in rosters {
            for block_id in &roster.block_ids {
                if let Some(block) = blocks_by_id.get(block_id.as_str()) {
                    for instance_id in &block.instance_ids {
                        assignments.push(Assignment {
                            assignment_id: format!("A-{}-{}", roster.roster_id, instance_id),
                            plan_id: "PENDING".to_string(),
                            instance_id: instance_id.clone(),
                            roster_id: roster.roster_id.clone(),
                        });
                    }
                }
            }
        }
        assignments
    };

    let (final_rosters, audit_records) = solvereign_validator::audit_and_repair(
        &instances,
        &blocks,
        selected_rosters,
        &roster_pool_by_id,
        &assignments_from,
        solver_config,
        plan_id,
        now,
    )?;

    let final_assignments: Vec<Assignment> = assignments_from(&final_rosters)
        .into_iter()
        .map(|mut a| {
            a.plan_id = plan_id.to_string();
            a
        })
        .collect();

    let covered_instances = final_assignments
        .iter()
        .map(|a| a.instance_id.clone())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    let kpis = PlanKpis::compute(&final_rosters, instances.len(), covered_instances);

    let solver_config_hash = canonical_hash(solver_config)?;
    let output_hash = canonical_hash(&final_assignments)?;

    let mut plan = PlanVersion {
        plan_id: plan_id.to_string(),
        forecast_id: forecast_id.to_string(),
        status: PlanStatus::Solving,
        solver_config_hash,
        output_hash: Some(output_hash),
        created_at: now,
        locked_at: None,
        superseded_by: None,
    };
    solvereign_versioning::lifecycle::transition_plan(&mut plan, PlanStatus::Draft)?;
    solvereign_versioning::lifecycle::transition_plan(&mut plan, PlanStatus::Audited)?;

    Ok(PipelineOutput {
        forecast,
        plan,
        instances,
        blocks,
        rosters: final_rosters,
        assignments: final_assignments,
        audit_records,
        kpis,
    })
}
