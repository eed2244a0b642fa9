//! Comparison of a dive against the diver's recent history.

use crate::models::{HistoryEntry, LogId};

/// Personal-best comparison against prior logs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonalBest {
    pub is_pb: bool,
    /// Deepest prior dive, `None` without history
    pub prev_best_m: Option<f64>,
}

/// Drop the audited log from a history fetch and keep at most `limit` rows.
///
/// Stores return the newest logs first, which usually include the log being
/// audited; comparing a dive with itself would hide every personal best.
pub fn prior_logs(history: Vec<HistoryEntry>, current: &LogId, limit: usize) -> Vec<HistoryEntry> {
    history
        .into_iter()
        .filter(|entry| &entry.id != current)
        .take(limit)
        .collect()
}

/// Flag a personal best when the dive is deeper than every prior log.
///
/// Prior logs without a depth count as 0 m. An empty history never yields a
/// personal best.
pub fn personal_best(reached_depth_m: Option<f64>, prior: &[HistoryEntry]) -> PersonalBest {
    if prior.is_empty() {
        return PersonalBest {
            is_pb: false,
            prev_best_m: None,
        };
    }

    let prev_best = prior
        .iter()
        .map(|entry| entry.reached_depth_m.unwrap_or(0.0))
        .fold(0.0_f64, f64::max);

    PersonalBest {
        is_pb: reached_depth_m.is_some_and(|d| d > prev_best),
        prev_best_m: Some(prev_best),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, depth: Option<f64>) -> HistoryEntry {
        HistoryEntry {
            id: LogId(id.to_string()),
            reached_depth_m: depth,
            ..HistoryEntry::default()
        }
    }

    #[test]
    fn test_personal_best() {
        let history = vec![entry("a", Some(40.0)), entry("b", Some(55.0))];

        let pb = personal_best(Some(60.0), &history);
        assert!(pb.is_pb);
        assert_eq!(pb.prev_best_m, Some(55.0));

        let pb = personal_best(Some(50.0), &history);
        assert!(!pb.is_pb);
        assert_eq!(pb.prev_best_m, Some(55.0));
    }

    #[test]
    fn test_missing_history_depths_count_as_zero() {
        let history = vec![entry("a", None), entry("b", None)];
        let pb = personal_best(Some(12.0), &history);
        assert!(pb.is_pb);
        assert_eq!(pb.prev_best_m, Some(0.0));

        assert!(!personal_best(None, &history).is_pb);
    }

    #[test]
    fn test_empty_history_is_never_pb() {
        let pb = personal_best(Some(100.0), &[]);
        assert!(!pb.is_pb);
        assert_eq!(pb.prev_best_m, None);
    }

    #[test]
    fn test_prior_logs_excludes_current() {
        let history = vec![
            entry("current", Some(60.0)),
            entry("a", Some(40.0)),
            entry("b", Some(55.0)),
            entry("c", Some(20.0)),
        ];
        let prior = prior_logs(history, &LogId("current".to_string()), 2);
        let ids: Vec<_> = prior.iter().map(|e| e.id.0.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
