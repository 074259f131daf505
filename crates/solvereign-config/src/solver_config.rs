use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for block construction, roster generation and the RMP solver.
/// Defaults here match the §6.2 option table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub seed: u64,
    pub max_blocks_per_day: u32,
    pub triple_gap_min: u32,
    pub triple_gap_max: u32,
    pub split_break_min: u32,
    pub split_break_max: u32,
    pub span_regular_max_min: u32,
    pub three_chain_span_max_min: u32,
    pub min_rest_min: u32,
    pub fte_target_band_min: u32,
    pub fte_target_band_max: u32,
    pub core_pt_target_band_min: u32,
    pub core_pt_target_band_max: u32,
    pub flex_pt_target_band_min: u32,
    pub flex_pt_target_band_max: u32,
    pub weekly_hours_cap_min: u32,
    pub freeze_window_minutes: u32,
    pub n_repair_ops: u32,
    pub exact_solve_threshold: usize,
    pub stall_rounds_limit: u32,
    pub max_rounds: u32,
    pub rmp_time_limit_s: u32,
    pub final_time_limit_s: u32,
    pub max_candidates_per_duty: u32,
    pub w_under: f64,
    pub pt_base: f64,
    pub fte_base: f64,
    pub dev_weight: f64,
    pub churn_weight: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            seed: 42,
            max_blocks_per_day: 3,
            triple_gap_min: 30,
            triple_gap_max: 60,
            split_break_min: 240,
            split_break_max: 360,
            span_regular_max_min: 14 * 60,
            three_chain_span_max_min: 16 * 60,
            min_rest_min: 11 * 60,
            fte_target_band_min: 40 * 60,
            fte_target_band_max: 53 * 60,
            core_pt_target_band_min: 13 * 60 + 30,
            core_pt_target_band_max: 40 * 60 - 1,
            flex_pt_target_band_min: 1,
            flex_pt_target_band_max: 13 * 60 + 29,
            weekly_hours_cap_min: 55 * 60,
            freeze_window_minutes: 12 * 60,
            n_repair_ops: 25,
            exact_solve_threshold: 14,
            stall_rounds_limit: 20,
            max_rounds: 500,
            rmp_time_limit_s: 45,
            final_time_limit_s: 300,
            max_candidates_per_duty: 50,
            w_under: 1e8,
            pt_base: 1e6,
            fte_base: 5e4,
            dev_weight: 1e2,
            churn_weight: 0.0,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.split_break_min >= self.split_break_max {
            return Err(ConfigError::Invalid(
                "split_break_min must be < split_break_max".into(),
            ));
        }
        if self.triple_gap_min >= self.triple_gap_max {
            return Err(ConfigError::Invalid(
                "triple_gap_min must be < triple_gap_max".into(),
            ));
        }
        if self.fte_target_band_min >= self.fte_target_band_max
            || self.core_pt_target_band_min >= self.core_pt_target_band_max
            || self.flex_pt_target_band_min >= self.flex_pt_target_band_max
        {
            return Err(ConfigError::Invalid(
                "every target band must have min < max".into(),
            ));
        }
        if self.max_blocks_per_day == 0 {
            return Err(ConfigError::Invalid(
                "max_blocks_per_day must be positive".into(),
            ));
        }
        if self.min_rest_min == 0 {
            return Err(ConfigError::Invalid("min_rest_min must be positive".into()));
        }
        if self.three_chain_span_max_min < self.min_rest_min {
            tracing::warn!(
                three_chain_span_max_min = self.three_chain_span_max_min,
                "THREE_CHAIN span cap is tighter than the legacy 16h reading; \
                 this is a breaking configuration change"
            );
        }
        if self.exact_solve_threshold == 0 {
            return Err(ConfigError::Invalid(
                "exact_solve_threshold must be positive".into(),
            ));
        }
        if self.span_regular_max_min == 0 {
            return Err(ConfigError::Invalid(
                "span_regular_max_min must be positive".into(),
            ));
        }
        Ok(())
    }
}
