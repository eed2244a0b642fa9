use serde::{Deserialize, Serialize};

use crate::parse;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single freediving log as held by the store.
///
/// Every fact is optional: logs arrive half-filled from forms and photo
/// extraction, and the auditor defaults instead of rejecting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiveLogRecord {
    pub id: LogId,
    pub user_id: UserId,
    pub date: Option<String>,
    pub discipline: Option<String>,
    pub location: Option<String>,
    pub reached_depth_m: Option<f64>,
    pub mouthfill_depth_m: Option<f64>,
    pub total_time_sec: Option<i32>,
    pub bottom_time_sec: Option<i32>,
    pub descent_sec: Option<i32>,
    pub ascent_sec: Option<i32>,
    pub descent_speed_mps: Option<f64>,
    pub ascent_speed_mps: Option<f64>,
    pub ear_squeeze: Option<bool>,
    pub lung_squeeze: Option<bool>,
    pub narcosis_level: Option<i32>,
    pub recovery_quality: Option<i32>,
}

impl DiveLogRecord {
    pub fn new(user_id: &UserId, id: &LogId) -> Self {
        Self {
            id: id.clone(),
            user_id: user_id.clone(),
            ..Self::default()
        }
    }

    /// Fill absent depth and timing facts from photo-extracted text.
    ///
    /// Fields the diver already entered are never replaced; values the parser
    /// cannot read are dropped.
    pub fn merge_extracted(&mut self, metrics: &ExtractedMetrics) {
        if self.reached_depth_m.is_none() {
            self.reached_depth_m = metrics.max_depth.as_deref().and_then(parse::lenient_depth_m);
        }
        if self.total_time_sec.is_none() {
            self.total_time_sec = metrics.dive_time.as_deref().and_then(parse::lenient_duration_sec);
        }
        if self.bottom_time_sec.is_none() {
            self.bottom_time_sec = metrics
                .bottom_time
                .as_deref()
                .and_then(parse::lenient_duration_sec);
        }
    }

    /// The partial view used for trend comparison.
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            id: self.id.clone(),
            date: self.date.clone(),
            reached_depth_m: self.reached_depth_m,
            total_time_sec: self.total_time_sec,
            ear_squeeze: self.ear_squeeze,
            lung_squeeze: self.lung_squeeze,
            recovery_quality: self.recovery_quality,
        }
    }

    /// Apply a derived-fields patch, leaving fields without a new value untouched.
    pub fn apply_patch(&mut self, patch: &DerivedFieldsPatch) {
        if let Some(v) = patch.descent_sec {
            self.descent_sec = Some(v);
        }
        if let Some(v) = patch.ascent_sec {
            self.ascent_sec = Some(v);
        }
        if let Some(v) = patch.descent_speed_mps {
            self.descent_speed_mps = Some(v);
        }
        if let Some(v) = patch.ascent_speed_mps {
            self.ascent_speed_mps = Some(v);
        }
    }
}

/// Prior log fields needed for trend comparison.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryEntry {
    pub id: LogId,
    pub date: Option<String>,
    pub reached_depth_m: Option<f64>,
    pub total_time_sec: Option<i32>,
    pub ear_squeeze: Option<bool>,
    pub lung_squeeze: Option<bool>,
    pub recovery_quality: Option<i32>,
}

/// Derived timing and speed values to write back to a log.
///
/// `None` means "nothing computed": stores must keep the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DerivedFieldsPatch {
    pub descent_sec: Option<i32>,
    pub ascent_sec: Option<i32>,
    pub descent_speed_mps: Option<f64>,
    pub ascent_speed_mps: Option<f64>,
}

/// Raw text read off a dive computer photo.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedMetrics {
    pub max_depth: Option<String>,
    pub dive_time: Option<String>,
    pub bottom_time: Option<String>,
}

/// Safety and completeness tags raised by an audit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFlag {
    DepthMissingOrZero,
    VeryLongTotalTime,
    DescentTooFast,
    AscentTooFast,
    EarSqueezeReported,
    LungSqueezeReported,
    NarcosisConcern,
    PoorRecovery,
    PersonalBest,
}

impl AuditFlag {
    pub fn tag(&self) -> &'static str {
        match self {
            AuditFlag::DepthMissingOrZero => "depth_missing_or_zero",
            AuditFlag::VeryLongTotalTime => "very_long_total_time",
            AuditFlag::DescentTooFast => "descent_too_fast",
            AuditFlag::AscentTooFast => "ascent_too_fast",
            AuditFlag::EarSqueezeReported => "ear_squeeze_reported",
            AuditFlag::LungSqueezeReported => "lung_squeeze_reported",
            AuditFlag::NarcosisConcern => "narcosis_concern",
            AuditFlag::PoorRecovery => "poor_recovery",
            AuditFlag::PersonalBest => "personal_best",
        }
    }
}

/// Times, speeds and trend facts computed for one log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedMetrics {
    pub total_time_sec: Option<i32>,
    pub bottom_time_sec: i32,
    pub descent_sec: Option<i32>,
    pub ascent_sec: Option<i32>,
    pub descent_speed_mps: Option<f64>,
    pub ascent_speed_mps: Option<f64>,
    #[serde(rename = "isPB")]
    pub is_pb: bool,
    #[serde(rename = "depthPrevBest")]
    pub depth_prev_best_m: Option<f64>,
}

/// Output of one audit run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Share of required fields present, 0-100 in steps of 20
    pub completeness: u8,
    /// Composite risk, 0-100
    pub risk: u8,
    pub flags: Vec<AuditFlag>,
    pub computed: ComputedMetrics,
    pub summary: String,
    pub suggestions: String,
}

impl AuditResult {
    pub fn has_flag(&self, flag: AuditFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Persisted audit row, one per `(user_id, log_id)`.
#[derive(Clone, Debug, PartialEq)]
pub struct DiveLogAudit {
    pub user_id: UserId,
    pub log_id: LogId,
    pub result: AuditResult,
    pub computed_at_unix: i64,
}
