use std::path::Path;

use crate::error::ConfigError;
use crate::solver_config::SolverConfig;
use crate::whitelist_config::ParserWhitelistConfig;

/// Top-level config document: `[solver]` and `[whitelist]` tables.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct ConfigDocument {
    solver: SolverConfig,
    whitelist: ParserWhitelistConfig,
}

/// Loads configuration following `env > file > defaults`: start from
/// `SolverConfig::default()`/`ParserWhitelistConfig::default()`, overlay the
/// TOML file if present, then overlay `SOLVEREIGN_SOLVER_*` environment
/// variables, then validate.
pub fn load_config(path: Option<&Path>) -> Result<(SolverConfig, ParserWhitelistConfig), ConfigError> {
    let mut doc = match path {
        Some(p) => load_from_file(p)?,
        None => ConfigDocument::default(),
    };

    apply_env_overrides(&mut doc.solver)?;
    doc.solver.validate()?;

    Ok((doc.solver, doc.whitelist))
}

fn load_from_file(path: &Path) -> Result<ConfigDocument, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Applies `SOLVEREIGN_SOLVER_<FIELD>` environment overrides, matching the
/// field names of `SolverConfig`.
fn apply_env_overrides(config: &mut SolverConfig) -> Result<(), ConfigError> {
    macro_rules! override_u64 {
        ($field:ident) => {
            if let Ok(value) = std::env::var(concat!(
                "SOLVEREIGN_SOLVER_",
                stringify!($field)
            ).to_uppercase()) {
                config.$field = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: concat!("SOLVEREIGN_SOLVER_", stringify!($field)).to_string(),
                    value: value.clone(),
                    reason: "expected an integer".to_string(),
                })?;
            }
        };
    }
    macro_rules! override_u32 {
        ($field:ident) => {
            if let Ok(value) = std::env::var(concat!(
                "SOLVEREIGN_SOLVER_",
                stringify!($field)
            ).to_uppercase()) {
                config.$field = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: concat!("SOLVEREIGN_SOLVER_", stringify!($field)).to_string(),
                    value: value.clone(),
                    reason: "expected an integer".to_string(),
                })?;
            }
        };
    }
    macro_rules! override_f64 {
        ($field:ident) => {
            if let Ok(value) = std::env::var(concat!(
                "SOLVEREIGN_SOLVER_",
                stringify!($field)
            ).to_uppercase()) {
                config.$field = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: concat!("SOLVEREIGN_SOLVER_", stringify!($field)).to_string(),
                    value: value.clone(),
                    reason: "expected a float".to_string(),
                })?;
            }
        };
    }

    override_u64!(seed);
    override_u32!(max_blocks_per_day);
    override_u32!(triple_gap_min);
    override_u32!(triple_gap_max);
    override_u32!(split_break_min);
    override_u32!(split_break_max);
    override_u32!(span_regular_max_min);
    override_u32!(three_chain_span_max_min);
    override_u32!(min_rest_min);
    override_u32!(weekly_hours_cap_min);
    override_u32!(freeze_window_minutes);
    override_u32!(n_repair_ops);
    override_u32!(max_rounds);
    override_u32!(rmp_time_limit_s);
    override_u32!(final_time_limit_s);
    override_u32!(max_candidates_per_duty);
    override_f64!(w_under);
    override_f64!(pt_base);
    override_f64!(fte_base);
    override_f64!(dev_weight);
    override_f64!(churn_weight);

    Ok(())
}
