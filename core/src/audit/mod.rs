//! Dive log auditor.
//!
//! Turns a raw, often incomplete dive log into derived timings and speeds,
//! safety flags, a completeness score, a risk score and coaching text, then
//! writes the derived fields back to the log and upserts the audit row.
//!
//! # Example
//!
//! ```
//! use divelog_audit::audit::DiveLogAuditor;
//! use divelog_audit::models::{DiveLogRecord, LogId, UserId};
//! use divelog_audit::storage_memory::MemoryStore;
//!
//! let user = UserId("diver-1".to_string());
//! let log_id = LogId("log-1".to_string());
//! let mut store = MemoryStore::new();
//! store.insert_log(DiveLogRecord {
//!     reached_depth_m: Some(30.0),
//!     total_time_sec: Some(90),
//!     ..DiveLogRecord::new(&user, &log_id)
//! });
//!
//! let result = DiveLogAuditor::default()
//!     .run(&mut store, &user, &log_id)
//!     .expect("log exists");
//! assert_eq!(result.completeness, 40);
//! ```

pub mod derive;
pub mod history;
pub mod report;
pub mod scoring;

use chrono::Utc;
use tracing::{debug, info, info_span, warn};

use crate::config::AuditConfig;
use crate::error::{AuditError, StoreError};
use crate::models::{
    AuditFlag, AuditResult, ComputedMetrics, DerivedFieldsPatch, DiveLogAudit, DiveLogRecord,
    HistoryEntry, LogId, UserId,
};
use crate::storage::DiveLogStore;

/// Pure outcome of auditing one log: the result and the fields to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub result: AuditResult,
    pub patch: DerivedFieldsPatch,
}

/// Audits dive logs against a store.
///
/// The auditor holds no state besides its configuration; every run re-reads
/// the log and its history.
#[derive(Debug, Clone, Default)]
pub struct DiveLogAuditor {
    config: AuditConfig,
}

impl DiveLogAuditor {
    /// Create an auditor with a validated configuration.
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Audit `log_id` for `user_id`, persist the outcome and return it.
    ///
    /// Fails with [`AuditError::NotFound`] when the user has no such log and
    /// with [`AuditError::Upstream`] when the log cannot be read, a store call
    /// is aborted, or the audit row cannot be written. A failed history fetch
    /// or log patch is logged and otherwise ignored.
    pub fn run<S>(
        &self,
        store: &mut S,
        user_id: &UserId,
        log_id: &LogId,
    ) -> Result<AuditResult, AuditError>
    where
        S: DiveLogStore + ?Sized,
    {
        let span = info_span!("dive_log_audit", user_id = %user_id, log_id = %log_id);
        let _guard = span.enter();

        let log = store
            .fetch_log(user_id, log_id)?
            .ok_or_else(|| AuditError::NotFound {
                user_id: user_id.0.clone(),
                log_id: log_id.0.clone(),
            })?;

        let limit = self.config.history_limit;
        let prior = match store.fetch_history(user_id, limit.saturating_add(1)) {
            Ok(rows) => history::prior_logs(rows, log_id, limit),
            Err(StoreError::Aborted) => return Err(StoreError::Aborted.into()),
            Err(err) => {
                warn!(error = %err, "history unavailable, skipping trend comparison");
                Vec::new()
            }
        };

        let Evaluation { result, patch } = self.evaluate(&log, &prior);

        match store.update_log(user_id, log_id, &patch) {
            Ok(()) => {}
            Err(StoreError::Aborted) => return Err(StoreError::Aborted.into()),
            Err(err) => warn!(error = %err, "could not save derived fields"),
        }

        let audit = DiveLogAudit {
            user_id: user_id.clone(),
            log_id: log_id.clone(),
            result,
            computed_at_unix: Utc::now().timestamp(),
        };
        store.upsert_audit(&audit)?;

        info!(
            completeness = audit.result.completeness,
            risk = audit.result.risk,
            flags = audit.result.flags.len(),
            "dive log audited"
        );
        Ok(audit.result)
    }

    /// Audit a log against already-fetched prior logs without touching a store.
    pub fn evaluate(&self, log: &DiveLogRecord, prior: &[HistoryEntry]) -> Evaluation {
        let thresholds = &self.config.thresholds;

        let times = derive::derive_times(log, thresholds.descent_split_ratio);
        let speeds = derive::derive_speeds(log.reached_depth_m, &times);
        debug!(
            split_applied = times.split_applied,
            descent_sec = times.descent_sec,
            ascent_sec = times.ascent_sec,
            "derived dive timings"
        );

        let completeness = scoring::completeness(log);
        let mut flags = scoring::evaluate_flags(log, &times, &speeds, thresholds);

        let pb = history::personal_best(log.reached_depth_m, prior);
        if pb.is_pb {
            flags.push(AuditFlag::PersonalBest);
        }

        let risk = scoring::risk_score(log, &flags, &self.config.risk);

        let computed = ComputedMetrics {
            total_time_sec: times.total_sec,
            bottom_time_sec: times.bottom_sec,
            descent_sec: times.descent_sec,
            ascent_sec: times.ascent_sec,
            descent_speed_mps: speeds.descent_mps,
            ascent_speed_mps: speeds.ascent_mps,
            is_pb: pb.is_pb,
            depth_prev_best_m: pb.prev_best_m,
        };

        let summary = report::summary(log, &computed);
        let suggestions = report::suggestions(log, &computed, &flags, thresholds);

        let patch = DerivedFieldsPatch {
            descent_sec: times.descent_sec,
            ascent_sec: times.ascent_sec,
            descent_speed_mps: speeds.descent_mps,
            ascent_speed_mps: speeds.ascent_mps,
        };

        Evaluation {
            result: AuditResult {
                completeness,
                risk,
                flags,
                computed,
                summary,
                suggestions,
            },
            patch,
        }
    }
}

/// Audit with the default configuration.
pub fn audit_log<S>(
    store: &mut S,
    user_id: &UserId,
    log_id: &LogId,
) -> Result<AuditResult, AuditError>
where
    S: DiveLogStore + ?Sized,
{
    DiveLogAuditor::default().run(store, user_id, log_id)
}
