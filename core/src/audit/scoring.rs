//! Completeness, safety flags and the composite risk score.

use crate::audit::derive::{DerivedSpeeds, DerivedTimes};
use crate::config::{AuditThresholds, RiskWeights};
use crate::models::{AuditFlag, DiveLogRecord};

/// Fields a log needs to count as complete: date, discipline, location,
/// reached depth and total time.
const REQUIRED_FIELDS: usize = 5;

/// Percentage of required fields present, always a multiple of 20.
pub fn completeness(log: &DiveLogRecord) -> u8 {
    let present = [
        has_text(&log.date),
        has_text(&log.discipline),
        has_text(&log.location),
        log.reached_depth_m.is_some(),
        log.total_time_sec.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count();

    (present as f64 / REQUIRED_FIELDS as f64 * 100.0).round() as u8
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Evaluate every per-dive safety and completeness flag.
///
/// Each condition is checked independently and raises at most one flag.
/// Trend flags that need history are added by the caller.
pub fn evaluate_flags(
    log: &DiveLogRecord,
    times: &DerivedTimes,
    speeds: &DerivedSpeeds,
    thresholds: &AuditThresholds,
) -> Vec<AuditFlag> {
    let mut flags = Vec::new();

    if !log.reached_depth_m.is_some_and(|d| d > 0.0) {
        flags.push(AuditFlag::DepthMissingOrZero);
    }
    if times
        .total_sec
        .is_some_and(|t| t > thresholds.long_total_time_sec)
    {
        flags.push(AuditFlag::VeryLongTotalTime);
    }
    if times.descent_sec.is_some()
        && speeds
            .descent_mps
            .is_some_and(|v| v > thresholds.max_descent_mps)
    {
        flags.push(AuditFlag::DescentTooFast);
    }
    if times.ascent_sec.is_some()
        && speeds
            .ascent_mps
            .is_some_and(|v| v > thresholds.max_ascent_mps)
    {
        flags.push(AuditFlag::AscentTooFast);
    }
    if log.ear_squeeze == Some(true) {
        flags.push(AuditFlag::EarSqueezeReported);
    }
    if log.lung_squeeze == Some(true) {
        flags.push(AuditFlag::LungSqueezeReported);
    }
    if log
        .narcosis_level
        .is_some_and(|n| n >= thresholds.narcosis_concern_level)
    {
        flags.push(AuditFlag::NarcosisConcern);
    }
    if log
        .recovery_quality
        .is_some_and(|q| q <= thresholds.poor_recovery_level)
    {
        flags.push(AuditFlag::PoorRecovery);
    }

    flags
}

/// Composite risk in `[0, 100]`.
///
/// Sum of a linear depth term capped at `depth_max_points`, speed penalties
/// for the too-fast flags and physiological penalties for squeezes and
/// narcosis.
pub fn risk_score(log: &DiveLogRecord, flags: &[AuditFlag], weights: &RiskWeights) -> u8 {
    let depth_points = log
        .reached_depth_m
        .filter(|d| d.is_finite())
        .map(|d| {
            (d / weights.depth_reference_m * weights.depth_max_points)
                .clamp(0.0, weights.depth_max_points)
        })
        .unwrap_or(0.0);

    let mut speed_points = 0.0;
    if flags.contains(&AuditFlag::AscentTooFast) {
        speed_points += weights.ascent_too_fast;
    }
    if flags.contains(&AuditFlag::DescentTooFast) {
        speed_points += weights.descent_too_fast;
    }

    let mut physio_points = 0.0;
    if log.lung_squeeze == Some(true) {
        physio_points += weights.lung_squeeze;
    }
    if log.ear_squeeze == Some(true) {
        physio_points += weights.ear_squeeze;
    }
    if flags.contains(&AuditFlag::NarcosisConcern) {
        physio_points += weights.narcosis;
    }

    let total: f64 = depth_points + speed_points + physio_points;
    total.clamp(0.0, 100.0).round() as u8
}
