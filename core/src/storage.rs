use crate::error::StoreError;
use crate::models::{DerivedFieldsPatch, DiveLogAudit, DiveLogRecord, HistoryEntry, LogId, UserId};

/// Data access needed by the auditor. Every call is scoped to one user.
pub trait DiveLogStore {
    fn fetch_log(&self, user_id: &UserId, log_id: &LogId)
        -> Result<Option<DiveLogRecord>, StoreError>;

    /// Most recent logs first, by dive date, at most `limit` rows.
    fn fetch_history(&self, user_id: &UserId, limit: usize)
        -> Result<Vec<HistoryEntry>, StoreError>;

    /// Write derived fields; `None` fields in the patch keep the stored value.
    fn update_log(
        &mut self,
        user_id: &UserId,
        log_id: &LogId,
        patch: &DerivedFieldsPatch,
    ) -> Result<(), StoreError>;

    /// Insert or overwrite the audit keyed by `(user_id, log_id)`.
    fn upsert_audit(&mut self, audit: &DiveLogAudit) -> Result<(), StoreError>;
}
