use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Day of the scheduling week. Ordered Monday-first to match `week_anchor_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub fn offset(self) -> i64 {
        match self {
            Day::Mon => 0,
            Day::Tue => 1,
            Day::Wed => 2,
            Day::Thu => 3,
            Day::Fri => 4,
            Day::Sat => 5,
            Day::Sun => 6,
        }
    }

    pub fn all() -> [Day; 7] {
        [
            Day::Mon,
            Day::Tue,
            Day::Wed,
            Day::Thu,
            Day::Fri,
            Day::Sat,
            Day::Sun,
        ]
    }
}

/// Block taxonomy, per the Block Taxonomy Table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlockType {
    One,
    TwoReg,
    TwoSplit,
    ThreeChain,
}

impl BlockType {
    /// Higher priority sorts first in tie-breaks (THREE_CHAIN > TWO_* > ONE).
    pub fn priority(self) -> u8 {
        match self {
            BlockType::ThreeChain => 3,
            BlockType::TwoReg | BlockType::TwoSplit => 2,
            BlockType::One => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FteClass {
    Fte,
    CorePt,
    FlexPt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParseStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ForecastStatus {
    Pending,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlanStatus {
    Solving,
    Draft,
    Audited,
    Locked,
    Failed,
    Superseded,
}

impl ForecastStatus {
    /// Monotone lifecycle: PENDING -> READY | FAILED, both terminal.
    pub fn can_transition_to(self, next: ForecastStatus) -> bool {
        matches!(
            (self, next),
            (ForecastStatus::Pending, ForecastStatus::Ready)
                | (ForecastStatus::Pending, ForecastStatus::Failed)
        )
    }
}

impl PlanStatus {
    /// Monotone lifecycle: SOLVING -> DRAFT -> AUDITED -> LOCKED -> SUPERSEDED,
    /// with FAILED reachable from SOLVING or DRAFT.
    pub fn can_transition_to(self, next: PlanStatus) -> bool {
        use PlanStatus::*;
        matches!(
            (self, next),
            (Solving, Draft)
                | (Solving, Failed)
                | (Draft, Audited)
                | (Draft, Failed)
                | (Audited, Locked)
                | (Audited, Failed)
                | (Locked, Superseded)
        )
    }
}

/// A recurring tour as described in the forecast, before expansion onto the
/// calendar. A split-notation forecast line (`start-end + start-end`)
/// becomes two templates, one per leg; `end_min <= start_min` means the leg
/// itself crosses midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourTemplate {
    pub template_id: String,
    pub day: Day,
    pub start_min: u32,
    pub end_min: u32,
    pub depot: Option<String>,
    pub skill: Option<String>,
    pub count: u32,
}

impl TourTemplate {
    pub fn crosses_midnight(&self) -> bool {
        self.end_min <= self.start_min
    }

    pub fn duration_min(&self) -> u32 {
        if self.crosses_midnight() {
            self.end_min + 24 * 60 - self.start_min
        } else {
            self.end_min - self.start_min
        }
    }

    /// Fingerprint used by the diff engine: `H(day, start, end, depot,
    /// skill)`. `count` is deliberately excluded — two templates differing
    /// only in headcount are the same recurring tour.
    pub fn fingerprint(&self) -> String {
        format!(
            "{:?}|{}|{}|{}|{}",
            self.day,
            self.start_min,
            self.end_min,
            self.depot.as_deref().unwrap_or(""),
            self.skill.as_deref().unwrap_or("")
        )
    }
}

/// A single concrete, dated occurrence of a `TourTemplate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourInstance {
    pub instance_id: String,
    pub template_id: String,
    pub instance_no: u32,
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub crosses_midnight: bool,
    pub depot: Option<String>,
    pub skill: Option<String>,
}

impl TourInstance {
    /// Total-order sort key guaranteeing deterministic enumeration
    /// regardless of insertion order: `(start_datetime, template_id,
    /// instance_no)`.
    pub fn sort_key(&self) -> (NaiveDateTime, String, u32) {
        (self.start, self.template_id.clone(), self.instance_no)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastVersion {
    pub forecast_id: String,
    pub week_anchor_date: NaiveDate,
    pub status: ForecastStatus,
    pub raw_lines: Vec<String>,
    pub input_hash: String,
    pub templates: Vec<TourTemplate>,
    pub created_at: NaiveDateTime,
}

/// A contiguous working block made of one or more instances worked by the
/// same driver on the same day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_id: String,
    pub block_type: BlockType,
    pub instance_ids: Vec<String>,
    pub span_min: u32,
    pub work_min: u32,
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Block {
    /// Deterministic tie-break key: (type priority desc, span asc, first instance id).
    pub fn tie_break_key(&self) -> (std::cmp::Reverse<u8>, u32, String) {
        (
            std::cmp::Reverse(self.block_type.priority()),
            self.span_min,
            self.instance_ids.first().cloned().unwrap_or_default(),
        )
    }
}

/// A candidate weekly work pattern for one driver: a set of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub roster_id: String,
    pub driver_label: String,
    pub fte_class: FteClass,
    pub block_ids: Vec<String>,
    pub total_work_minutes: u32,
}

impl Roster {
    /// Stable fingerprint for RMP tie-breaking, independent of construction order.
    pub fn fingerprint(&self) -> String {
        let mut ids = self.block_ids.clone();
        ids.sort();
        format!("{:?}|{}", self.fte_class, ids.join(","))
    }
}

/// A prior plan's instance-to-block assignment, consulted by the RMP solver
/// to fix variables for instances that fall inside the freeze window: any
/// instance starting within `freeze_window_minutes` of `now` must keep the
/// block it was assigned in the baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub instance_block: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: String,
    pub plan_id: String,
    pub instance_id: String,
    pub roster_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanVersion {
    pub plan_id: String,
    pub forecast_id: String,
    pub status: PlanStatus,
    pub solver_config_hash: String,
    pub output_hash: Option<String>,
    pub created_at: NaiveDateTime,
    pub locked_at: Option<NaiveDateTime>,
    pub superseded_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: String,
    pub plan_id: String,
    pub seq: u64,
    pub check_id: String,
    pub passed: bool,
    pub message: String,
    pub counters: BTreeMap<String, u64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub forecast_a_id: String,
    pub forecast_b_id: String,
    pub added_template_ids: Vec<String>,
    pub removed_template_ids: Vec<String>,
    pub changed_template_ids: Vec<String>,
}

/// Plan-level KPIs, computed from a solved and audited `PlanVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanKpis {
    pub headcount: u32,
    pub fte_count: u32,
    pub core_pt_count: u32,
    pub flex_pt_count: u32,
    pub avg_fte_hours: f64,
    pub max_weekly_hours: f64,
    pub coverage_pct: f64,
}

impl PlanKpis {
    pub fn compute(rosters: &[Roster], total_instances: usize, covered_instances: usize) -> Self {
        let headcount = rosters.len() as u32;
        let fte_count = rosters
            .iter()
            .filter(|r| r.fte_class == FteClass::Fte)
            .count() as u32;
        let core_pt_count = rosters
            .iter()
            .filter(|r| r.fte_class == FteClass::CorePt)
            .count() as u32;
        let flex_pt_count = rosters
            .iter()
            .filter(|r| r.fte_class == FteClass::FlexPt)
            .count() as u32;

        let fte_hours: Vec<f64> = rosters
            .iter()
            .filter(|r| r.fte_class == FteClass::Fte)
            .map(|r| r.total_work_minutes as f64 / 60.0)
            .collect();
        let avg_fte_hours = if fte_hours.is_empty() {
            0.0
        } else {
            fte_hours.iter().sum::<f64>() / fte_hours.len() as f64
        };

        let max_weekly_hours = rosters
            .iter()
            .map(|r| r.total_work_minutes as f64 / 60.0)
            .fold(0.0_f64, f64::max);

        let coverage_pct = if total_instances == 0 {
            100.0
        } else {
            covered_instances as f64 / total_instances as f64 * 100.0
        };

        PlanKpis {
            headcount,
            fte_count,
            core_pt_count,
            flex_pt_count,
            avg_fte_hours,
            max_weekly_hours,
            coverage_pct,
        }
    }
}
