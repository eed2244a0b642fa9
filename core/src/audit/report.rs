//! Human-readable summary and coaching suggestions.

use crate::config::AuditThresholds;
use crate::models::{AuditFlag, ComputedMetrics, DiveLogRecord};

/// Stand-in for any unknown number in the summary.
const UNKNOWN: &str = "\u{2013}";

pub const NO_ISSUES: &str = "No immediate issues detected.";

const ASCENT_PACING_TIP: &str = "Ascent was quick: slow the final 20 m to about 1 m/s or less \
     and keep finning relaxed so you arrive at the surface with reserve.";
const LUNG_SQUEEZE_TIP: &str = "Lung squeeze reported: stop depth training and get medically \
     cleared before diving deep again, then rebuild depth gradually.";
const RECOVERY_TIP: &str = "Recovery was poor: run your surface protocol (hook breathing, \
     exhale-inhale-hold) on every exit and lengthen surface intervals.";
const MOUTHFILL_TIP: &str = "Log your mouthfill depth on constant weight dives so equalization \
     progress can be tracked.";

/// One-sentence description of the dive.
pub fn summary(log: &DiveLogRecord, computed: &ComputedMetrics) -> String {
    let discipline = text_or(&log.discipline, "Dive");
    let location = text_or(&log.location, "unknown location");

    format!(
        "{discipline} at {location}: reached {depth} m in {total} s total \
         (descent {descent} s at {descent_speed} m/s, ascent {ascent} s at {ascent_speed} m/s).",
        depth = number_or_unknown(log.reached_depth_m),
        total = number_or_unknown(computed.total_time_sec.map(f64::from)),
        descent = number_or_unknown(computed.descent_sec.map(f64::from)),
        descent_speed = number_or_unknown(computed.descent_speed_mps),
        ascent = number_or_unknown(computed.ascent_sec.map(f64::from)),
        ascent_speed = number_or_unknown(computed.ascent_speed_mps),
    )
}

/// Coaching tips as `- ` bullet lines, or [`NO_ISSUES`] when none apply.
///
/// Tips are evaluated in a fixed order: ascent pacing, lung squeeze,
/// recovery, missing mouthfill depth on constant weight dives.
pub fn suggestions(
    log: &DiveLogRecord,
    computed: &ComputedMetrics,
    flags: &[AuditFlag],
    thresholds: &AuditThresholds,
) -> String {
    let mut tips = Vec::new();

    if computed
        .ascent_speed_mps
        .is_some_and(|v| v > thresholds.ascent_advice_mps)
    {
        tips.push(ASCENT_PACING_TIP);
    }
    if log.lung_squeeze == Some(true) {
        tips.push(LUNG_SQUEEZE_TIP);
    }
    if flags.contains(&AuditFlag::PoorRecovery) {
        tips.push(RECOVERY_TIP);
    }
    if is_constant_weight(log.discipline.as_deref()) && log.mouthfill_depth_m.is_none() {
        tips.push(MOUTHFILL_TIP);
    }

    if tips.is_empty() {
        return NO_ISSUES.to_string();
    }
    tips.iter()
        .map(|tip| format!("- {tip}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// CWT and its bi-fin variant, in abbreviated or spelled-out form.
pub fn is_constant_weight(discipline: Option<&str>) -> bool {
    let Some(discipline) = discipline else {
        return false;
    };
    let normalized = discipline.trim().to_lowercase().replace(['-', '_'], " ");
    normalized.contains("cwt") || normalized.contains("constant weight")
}

fn text_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => fallback,
    }
}

fn number_or_unknown(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format_number(v),
        _ => UNKNOWN.to_string(),
    }
}

/// Up to three decimals, trailing zeros dropped.
fn format_number(value: f64) -> String {
    let formatted = format!("{value:.3}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
