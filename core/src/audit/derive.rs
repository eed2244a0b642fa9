//! Timing and speed derivation from partial dive data.

use tracing::debug;

use crate::models::DiveLogRecord;

/// Dive phase durations after filling gaps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedTimes {
    pub total_sec: Option<i32>,
    /// Bottom time, 0 when not logged
    pub bottom_sec: i32,
    pub descent_sec: Option<i32>,
    pub ascent_sec: Option<i32>,
    /// True when descent/ascent came from splitting travel time
    pub split_applied: bool,
}

/// Average vertical speeds in meters per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedSpeeds {
    pub descent_mps: Option<f64>,
    pub ascent_mps: Option<f64>,
}

/// Fill in descent and ascent times.
///
/// When neither leg was logged and the total is known, travel time
/// (`total - bottom`, floored at zero) is split with `descent_split_ratio`
/// going to the descent. A logged leg is never re-derived, even if the other
/// one is missing.
pub fn derive_times(log: &DiveLogRecord, descent_split_ratio: f64) -> DerivedTimes {
    let total_sec = log.total_time_sec;
    let bottom_sec = log.bottom_time_sec.unwrap_or(0);

    if log.descent_sec.is_some() || log.ascent_sec.is_some() {
        return DerivedTimes {
            total_sec,
            bottom_sec,
            descent_sec: log.descent_sec,
            ascent_sec: log.ascent_sec,
            split_applied: false,
        };
    }

    let Some(total) = total_sec else {
        debug!("no total time logged, descent and ascent stay unknown");
        return DerivedTimes {
            total_sec,
            bottom_sec,
            descent_sec: None,
            ascent_sec: None,
            split_applied: false,
        };
    };

    let travel = total.saturating_sub(bottom_sec).max(0);
    let descent = (f64::from(travel) * descent_split_ratio).round() as i32;
    let ascent = travel - descent;
    debug!(travel, descent, ascent, "split travel time");

    DerivedTimes {
        total_sec,
        bottom_sec,
        descent_sec: Some(descent),
        ascent_sec: Some(ascent),
        split_applied: true,
    }
}

/// Compute speeds from the reached depth and leg durations.
///
/// A speed is only claimed when the depth is positive and the leg lasted
/// longer than zero seconds.
pub fn derive_speeds(reached_depth_m: Option<f64>, times: &DerivedTimes) -> DerivedSpeeds {
    DerivedSpeeds {
        descent_mps: speed(reached_depth_m, times.descent_sec),
        ascent_mps: speed(reached_depth_m, times.ascent_sec),
    }
}

fn speed(depth_m: Option<f64>, duration_sec: Option<i32>) -> Option<f64> {
    match (depth_m, duration_sec) {
        (Some(depth), Some(secs)) if depth > 0.0 && secs > 0 => {
            Some(round_to(depth / f64::from(secs), 3))
        }
        _ => None,
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(total: Option<i32>, bottom: Option<i32>) -> DiveLogRecord {
        DiveLogRecord {
            total_time_sec: total,
            bottom_time_sec: bottom,
            ..DiveLogRecord::default()
        }
    }

    #[test]
    fn test_split_travel_time() {
        let times = derive_times(&log_with(Some(240), Some(10)), 0.52);
        assert_eq!(times.descent_sec, Some(120));
        assert_eq!(times.ascent_sec, Some(110));
        assert_eq!(times.bottom_sec, 10);
        assert!(times.split_applied);
    }

    #[test]
    fn test_bottom_longer_than_total_clamps() {
        let times = derive_times(&log_with(Some(60), Some(90)), 0.52);
        assert_eq!(times.descent_sec, Some(0));
        assert_eq!(times.ascent_sec, Some(0));
    }

    #[test]
    fn test_no_total_leaves_legs_unknown() {
        let times = derive_times(&log_with(None, Some(10)), 0.52);
        assert_eq!(times.descent_sec, None);
        assert_eq!(times.ascent_sec, None);
        assert!(!times.split_applied);
    }

    #[test]
    fn test_logged_leg_is_not_rederived() {
        let log = DiveLogRecord {
            total_time_sec: Some(240),
            descent_sec: Some(100),
            ..DiveLogRecord::default()
        };
        let times = derive_times(&log, 0.52);
        assert_eq!(times.descent_sec, Some(100));
        assert_eq!(times.ascent_sec, None);
    }

    #[test]
    fn test_speeds() {
        let times = derive_times(&log_with(Some(240), Some(10)), 0.52);
        let speeds = derive_speeds(Some(100.0), &times);
        assert_eq!(speeds.descent_mps, Some(0.833));
        assert_eq!(speeds.ascent_mps, Some(0.909));
    }

    #[test]
    fn test_speeds_need_depth_and_time() {
        let times = derive_times(&log_with(Some(240), Some(10)), 0.52);
        assert_eq!(derive_speeds(None, &times), DerivedSpeeds::default());
        assert_eq!(derive_speeds(Some(0.0), &times), DerivedSpeeds::default());
        assert_eq!(derive_speeds(Some(-5.0), &times), DerivedSpeeds::default());

        let zero = derive_times(&log_with(Some(10), Some(10)), 0.52);
        assert_eq!(derive_speeds(Some(30.0), &zero), DerivedSpeeds::default());
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(0.83333, 3) - 0.833).abs() < f64::EPSILON);
        assert!((round_to(33.5, 0) - 34.0).abs() < f64::EPSILON);
    }
}
