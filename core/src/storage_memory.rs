use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::models::{DerivedFieldsPatch, DiveLogAudit, DiveLogRecord, HistoryEntry, LogId, UserId};
use crate::storage::DiveLogStore;

type LogKey = (UserId, LogId);

/// Failure switches for exercising error paths.
#[derive(Clone, Debug, Default)]
pub struct StoreFaults {
    pub history: bool,
    pub update: bool,
    pub upsert: bool,
    /// Every call fails as if cancelled
    pub abort: bool,
}

/// In-process store keeping logs and audits in maps.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    logs: HashMap<LogKey, DiveLogRecord>,
    audits: HashMap<LogKey, DiveLogAudit>,
    pub faults: StoreFaults,
    pub update_calls: usize,
    pub upsert_calls: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_data() -> Self {
        let user = UserId("sample-diver".to_string());
        let mut store = Self::new();
        store.insert_log(DiveLogRecord {
            date: Some("2024-01-01".to_string()),
            discipline: Some("CWT".to_string()),
            location: Some("Dean's Blue Hole".to_string()),
            reached_depth_m: Some(42.0),
            total_time_sec: Some(110),
            bottom_time_sec: Some(5),
            recovery_quality: Some(4),
            ..DiveLogRecord::new(&user, &LogId("log-001".to_string()))
        });
        store.insert_log(DiveLogRecord {
            date: Some("2024-01-02".to_string()),
            discipline: Some("FIM".to_string()),
            location: Some("Dean's Blue Hole".to_string()),
            reached_depth_m: Some(38.0),
            total_time_sec: Some(135),
            ear_squeeze: Some(true),
            ..DiveLogRecord::new(&user, &LogId("log-002".to_string()))
        });
        store
    }

    /// Insert or replace a log, keyed by its owner and id.
    pub fn insert_log(&mut self, log: DiveLogRecord) {
        let key = (log.user_id.clone(), log.id.clone());
        self.logs.insert(key, log);
    }

    pub fn log(&self, user_id: &UserId, log_id: &LogId) -> Option<&DiveLogRecord> {
        self.logs.get(&(user_id.clone(), log_id.clone()))
    }

    pub fn audit(&self, user_id: &UserId, log_id: &LogId) -> Option<&DiveLogAudit> {
        self.audits.get(&(user_id.clone(), log_id.clone()))
    }

    pub fn audit_count(&self) -> usize {
        self.audits.len()
    }

    /// Remove a log together with its audit.
    pub fn delete_log(&mut self, user_id: &UserId, log_id: &LogId) -> bool {
        let key = (user_id.clone(), log_id.clone());
        self.audits.remove(&key);
        self.logs.remove(&key).is_some()
    }

    fn check_abort(&self) -> Result<(), StoreError> {
        if self.faults.abort {
            Err(StoreError::Aborted)
        } else {
            Ok(())
        }
    }
}

fn date_key(date: Option<&str>) -> Option<NaiveDate> {
    let date = date?.trim();
    NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d").ok()
}

impl DiveLogStore for MemoryStore {
    fn fetch_log(
        &self,
        user_id: &UserId,
        log_id: &LogId,
    ) -> Result<Option<DiveLogRecord>, StoreError> {
        self.check_abort()?;
        Ok(self.log(user_id, log_id).cloned())
    }

    fn fetch_history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        self.check_abort()?;
        if self.faults.history {
            return Err(StoreError::Unavailable("history fetch failed".to_string()));
        }

        let mut entries: Vec<HistoryEntry> = self
            .logs
            .values()
            .filter(|log| &log.user_id == user_id)
            .map(DiveLogRecord::to_history_entry)
            .collect();
        entries.sort_by(|a, b| {
            date_key(b.date.as_deref())
                .cmp(&date_key(a.date.as_deref()))
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    fn update_log(
        &mut self,
        user_id: &UserId,
        log_id: &LogId,
        patch: &DerivedFieldsPatch,
    ) -> Result<(), StoreError> {
        self.check_abort()?;
        self.update_calls += 1;
        if self.faults.update {
            return Err(StoreError::Unavailable("log update failed".to_string()));
        }

        if let Some(log) = self.logs.get_mut(&(user_id.clone(), log_id.clone())) {
            log.apply_patch(patch);
        }
        Ok(())
    }

    fn upsert_audit(&mut self, audit: &DiveLogAudit) -> Result<(), StoreError> {
        self.check_abort()?;
        self.upsert_calls += 1;
        if self.faults.upsert {
            return Err(StoreError::Unavailable("audit upsert failed".to_string()));
        }

        let key = (audit.user_id.clone(), audit.log_id.clone());
        self.audits.insert(key, audit.clone());
        Ok(())
    }
}
