use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use solvereign_cli::pipeline;
use solvereign_core::{AuditRecord, PlanKpis, PlanVersion};
use tracing_subscriber::EnvFilter;

/// What `solve` writes to `--out` and `lock`/`show` read back. Not part of
/// the persistence substrate proper; a convenience for driving the pipeline
/// across separate CLI invocations without a running process.
#[derive(Debug, Serialize, Deserialize)]
struct SolveReport {
    plan: PlanVersion,
    kpis: PlanKpis,
    audit_records: Vec<AuditRecord>,
}

#[derive(Parser)]
#[command(name = "solvereign", about = "Deterministic weekly driver-scheduling engine")]
struct Cli {
    /// Path to a TOML config file; falls back to defaults + env overrides.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parses a forecast file and prints its PASS/WARN/FAIL report.
    Parse { forecast_file: PathBuf },

    /// Runs the full pipeline (parse -> expand -> solve -> audit) and
    /// prints the resulting plan as JSON.
    Solve {
        forecast_file: PathBuf,
        /// Monday the forecast week begins on, e.g. 2026-08-03.
        #[arg(long)]
        week_anchor_date: NaiveDate,
        #[arg(long, default_value = "F1")]
        forecast_id: String,
        #[arg(long, default_value = "P1")]
        plan_id: String,
        /// Writes the solve report as JSON to this path, for `lock`/`show`.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Re-runs the audit checks against a freshly solved plan and reports
    /// pass/fail per check (no repair).
    Validate {
        forecast_file: PathBuf,
        #[arg(long)]
        week_anchor_date: NaiveDate,
    },

    /// Locks a previously solved plan report, stamping `locked_at`.
    Lock { report_file: PathBuf },

    /// Prints a previously solved plan report.
    Show { report_file: PathBuf },

    /// Diffs two forecast files' templates (added/removed/changed).
    Diff {
        forecast_a: PathBuf,
        forecast_b: PathBuf,
        #[arg(long)]
        week_anchor_date: NaiveDate,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("SOLVEREIGN_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let (solver_config, whitelist) = solvereign_config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Parse { forecast_file } => {
            let raw = std::fs::read_to_string(&forecast_file)?;
            let report = solvereign_parser::parse_forecast(&raw, &whitelist)?;
            for line in &report.lines {
                println!(
                    "{:>4} {:?} {}",
                    line.line_no,
                    line.status,
                    line.message.clone().unwrap_or_default()
                );
            }
            println!(
                "--\n{} lines, {} fail, {} warn, input_hash={}",
                report.lines.len(),
                report.fail_count,
                report.warn_count,
                report.input_hash
            );
        }

        Command::Solve {
            forecast_file,
            week_anchor_date,
            forecast_id,
            plan_id,
            out,
        } => {
            let raw = std::fs::read_to_string(&forecast_file)?;
            let now = Utc::now().naive_utc();
            let output = pipeline::run(
                &raw,
                week_anchor_date,
                &solver_config,
                &whitelist,
                &forecast_id,
                &plan_id,
                now,
                None,
            )?;
            let report = SolveReport {
                plan: output.plan,
                kpis: output.kpis,
                audit_records: output.audit_records,
            };
            let json = serde_json::to_string_pretty(&report)?;
            if let Some(path) = out {
                std::fs::write(path, &json)?;
            }
            println!("{}", json);
        }

        Command::Validate {
            forecast_file,
            week_anchor_date,
        } => {
            let raw = std::fs::read_to_string(&forecast_file)?;
            let now = Utc::now().naive_utc();
            let output = pipeline::run(
                &raw,
                week_anchor_date,
                &solver_config,
                &whitelist,
                "F-VALIDATE",
                "P-VALIDATE",
                now,
                None,
            )?;
            for record in &output.audit_records {
                println!("{} {} {}", record.check_id, record.passed, record.message);
            }
        }

        Command::Lock { report_file } => {
            let json = std::fs::read_to_string(&report_file)?;
            let mut report: SolveReport = serde_json::from_str(&json)?;
            let now = Utc::now().naive_utc();
            solvereign_versioning::lock::lock(&mut report.plan, now)?;
            let json = serde_json::to_string_pretty(&report)?;
            std::fs::write(&report_file, &json)?;
            println!("{}", json);
        }

        Command::Show { report_file } => {
            let json = std::fs::read_to_string(&report_file)?;
            let report: SolveReport = serde_json::from_str(&json)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Diff {
            forecast_a,
            forecast_b,
            week_anchor_date,
        } => {
            let now = Utc::now().naive_utc();
            let raw_a = std::fs::read_to_string(&forecast_a)?;
            let raw_b = std::fs::read_to_string(&forecast_b)?;
            let report_a = solvereign_parser::parse_forecast(&raw_a, &whitelist)?;
            let report_b = solvereign_parser::parse_forecast(&raw_b, &whitelist)?;

            let forecast_a = solvereign_core::ForecastVersion {
                forecast_id: "F-A".to_string(),
                week_anchor_date,
                status: solvereign_core::ForecastStatus::Ready,
                raw_lines: report_a.canonical_lines,
                input_hash: report_a.input_hash,
                templates: report_a.templates,
                created_at: now,
            };
            let forecast_b = solvereign_core::ForecastVersion {
                forecast_id: "F-B".to_string(),
                week_anchor_date,
                status: solvereign_core::ForecastStatus::Ready,
                raw_lines: report_b.canonical_lines,
                input_hash: report_b.input_hash,
                templates: report_b.templates,
                created_at: now,
            };

            let diff = solvereign_versioning::diff::diff(&forecast_a, &forecast_b);
            println!("{}", serde_json::to_string_pretty(&diff)?);
        }
    }

    Ok(())
}
