//! SQLite-backed dive log store.
//!
//! Numeric columns are read leniently: legacy rows and imports may hold text
//! such as `"45 m"` or `"3:20"`, which goes through [`crate::parse`]; anything
//! unreadable is treated as missing.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, Connection, ErrorCode, InterruptHandle, OptionalExtension, Row};

use crate::error::StoreError;
use crate::migrations;
use crate::models::{
    AuditFlag, AuditResult, ComputedMetrics, DerivedFieldsPatch, DiveLogAudit, DiveLogRecord,
    HistoryEntry, LogId, UserId,
};
use crate::parse;
use crate::storage::DiveLogStore;

const LOG_COLUMNS: &str = "id, user_id, date, discipline, location, reached_depth, \
     mouthfill_depth, total_time_seconds, bottom_time, descent_seconds, ascent_seconds, \
     descent_speed_mps, ascent_speed_mps, ear_squeeze, lung_squeeze, narcosis_level, \
     recovery_quality";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::ensure_schema(&mut conn)?;
        Ok(Self { conn })
    }

    /// Handle for cancelling a running query from another thread; the
    /// interrupted call fails with [`StoreError::Aborted`].
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert a log or replace its facts, keeping any existing audit.
    pub fn insert_log(&mut self, log: &DiveLogRecord) -> Result<(), StoreError> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO dive_logs ({LOG_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17) \
                     ON CONFLICT(user_id, id) DO UPDATE SET \
                     date = excluded.date, discipline = excluded.discipline, \
                     location = excluded.location, reached_depth = excluded.reached_depth, \
                     mouthfill_depth = excluded.mouthfill_depth, \
                     total_time_seconds = excluded.total_time_seconds, \
                     bottom_time = excluded.bottom_time, \
                     descent_seconds = excluded.descent_seconds, \
                     ascent_seconds = excluded.ascent_seconds, \
                     descent_speed_mps = excluded.descent_speed_mps, \
                     ascent_speed_mps = excluded.ascent_speed_mps, \
                     ear_squeeze = excluded.ear_squeeze, lung_squeeze = excluded.lung_squeeze, \
                     narcosis_level = excluded.narcosis_level, \
                     recovery_quality = excluded.recovery_quality"
                ),
                params![
                    log.id.0,
                    log.user_id.0,
                    log.date,
                    log.discipline,
                    log.location,
                    log.reached_depth_m,
                    log.mouthfill_depth_m,
                    log.total_time_sec,
                    log.bottom_time_sec,
                    log.descent_sec,
                    log.ascent_sec,
                    log.descent_speed_mps,
                    log.ascent_speed_mps,
                    log.ear_squeeze,
                    log.lung_squeeze,
                    log.narcosis_level,
                    log.recovery_quality,
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    /// Delete a log; its audit goes with it.
    pub fn delete_log(&mut self, user_id: &UserId, log_id: &LogId) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM dive_logs WHERE id = ?1 AND user_id = ?2",
                params![log_id.0, user_id.0],
            )
            .map_err(classify)?;
        Ok(deleted > 0)
    }

    pub fn fetch_audit(
        &self,
        user_id: &UserId,
        log_id: &LogId,
    ) -> Result<Option<DiveLogAudit>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT completeness_score, risk_score, flags, computed, summary, suggestions, \
                 computed_at FROM dive_log_audits WHERE user_id = ?1 AND log_id = ?2",
                params![user_id.0, log_id.0],
                |row| {
                    Ok((
                        row.get::<_, u8>(0)?,
                        row.get::<_, u8>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                },
            )
            .optional()
            .map_err(classify)?;

        let Some((completeness, risk, flags, computed, summary, suggestions, computed_at)) = row
        else {
            return Ok(None);
        };

        let flags: Vec<AuditFlag> = serde_json::from_str(&flags)?;
        let computed: ComputedMetrics = serde_json::from_str(&computed)?;
        Ok(Some(DiveLogAudit {
            user_id: user_id.clone(),
            log_id: log_id.clone(),
            result: AuditResult {
                completeness,
                risk,
                flags,
                computed,
                summary,
                suggestions,
            },
            computed_at_unix: computed_at,
        }))
    }
}

impl DiveLogStore for SqliteStore {
    fn fetch_log(
        &self,
        user_id: &UserId,
        log_id: &LogId,
    ) -> Result<Option<DiveLogRecord>, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {LOG_COLUMNS} FROM dive_logs WHERE id = ?1 AND user_id = ?2"),
                params![log_id.0, user_id.0],
                log_from_row,
            )
            .optional()
            .map_err(classify)
    }

    fn fetch_history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, date, reached_depth, total_time_seconds, ear_squeeze, lung_squeeze, \
                 recovery_quality FROM dive_logs WHERE user_id = ?1 \
                 ORDER BY date IS NULL, date DESC LIMIT ?2",
            )
            .map_err(classify)?;

        let rows = stmt
            .query_map(params![user_id.0, limit], |row| {
                Ok(HistoryEntry {
                    id: LogId(row.get(0)?),
                    date: text_column(row.get(1)?),
                    reached_depth_m: depth_column(row.get(2)?),
                    total_time_sec: seconds_column(row.get(3)?),
                    ear_squeeze: flag_column(row.get(4)?),
                    lung_squeeze: flag_column(row.get(5)?),
                    recovery_quality: level_column(row.get(6)?),
                })
            })
            .map_err(classify)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(classify)
    }

    fn update_log(
        &mut self,
        user_id: &UserId,
        log_id: &LogId,
        patch: &DerivedFieldsPatch,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "UPDATE dive_logs SET \
                 descent_seconds = COALESCE(?1, descent_seconds), \
                 ascent_seconds = COALESCE(?2, ascent_seconds), \
                 descent_speed_mps = COALESCE(?3, descent_speed_mps), \
                 ascent_speed_mps = COALESCE(?4, ascent_speed_mps) \
                 WHERE id = ?5 AND user_id = ?6",
                params![
                    patch.descent_sec,
                    patch.ascent_sec,
                    patch.descent_speed_mps,
                    patch.ascent_speed_mps,
                    log_id.0,
                    user_id.0,
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    fn upsert_audit(&mut self, audit: &DiveLogAudit) -> Result<(), StoreError> {
        let flags = serde_json::to_string(&audit.result.flags)?;
        let computed = serde_json::to_string(&audit.result.computed)?;
        self.conn
            .execute(
                "INSERT INTO dive_log_audits (user_id, log_id, completeness_score, risk_score, \
                 flags, computed, summary, suggestions, computed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 ON CONFLICT(user_id, log_id) DO UPDATE SET \
                 completeness_score = excluded.completeness_score, \
                 risk_score = excluded.risk_score, flags = excluded.flags, \
                 computed = excluded.computed, summary = excluded.summary, \
                 suggestions = excluded.suggestions, computed_at = excluded.computed_at",
                params![
                    audit.user_id.0,
                    audit.log_id.0,
                    audit.result.completeness,
                    audit.result.risk,
                    flags,
                    computed,
                    audit.result.summary,
                    audit.result.suggestions,
                    audit.computed_at_unix,
                ],
            )
            .map_err(classify)?;
        Ok(())
    }
}

/// Interrupted statements surface as aborts, everything else as SQLite errors.
fn classify(err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::OperationInterrupted) => StoreError::Aborted,
        _ => StoreError::Sqlite(err),
    }
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<DiveLogRecord> {
    Ok(DiveLogRecord {
        id: LogId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        date: text_column(row.get(2)?),
        discipline: text_column(row.get(3)?),
        location: text_column(row.get(4)?),
        reached_depth_m: depth_column(row.get(5)?),
        mouthfill_depth_m: depth_column(row.get(6)?),
        total_time_sec: seconds_column(row.get(7)?),
        bottom_time_sec: seconds_column(row.get(8)?),
        descent_sec: seconds_column(row.get(9)?),
        ascent_sec: seconds_column(row.get(10)?),
        descent_speed_mps: speed_column(row.get(11)?),
        ascent_speed_mps: speed_column(row.get(12)?),
        ear_squeeze: flag_column(row.get(13)?),
        lung_squeeze: flag_column(row.get(14)?),
        narcosis_level: level_column(row.get(15)?),
        recovery_quality: level_column(row.get(16)?),
    })
}

fn text_column(value: Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s),
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Null | Value::Blob(_) => None,
    }
}

fn depth_column(value: Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(i as f64),
        Value::Real(r) if r.is_finite() => Some(r),
        Value::Text(s) => parse::lenient_depth_m(&s),
        _ => None,
    }
}

fn speed_column(value: Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(i as f64),
        Value::Real(r) if r.is_finite() => Some(r),
        Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn seconds_column(value: Value) -> Option<i32> {
    match value {
        Value::Integer(i) => i32::try_from(i).ok(),
        Value::Real(r) if r.is_finite() => Some(r.round() as i32),
        Value::Text(s) => parse::lenient_duration_sec(&s),
        _ => None,
    }
}

fn level_column(value: Value) -> Option<i32> {
    match value {
        Value::Integer(i) => i32::try_from(i).ok(),
        Value::Real(r) if r.is_finite() => Some(r.round() as i32),
        Value::Text(s) => parse::lenient_level(&s),
        _ => None,
    }
}

fn flag_column(value: Value) -> Option<bool> {
    match value {
        Value::Integer(i) => Some(i != 0),
        Value::Text(s) => parse::lenient_flag(&s),
        _ => None,
    }
}
