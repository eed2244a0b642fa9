pub mod audit;
pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod parse;
pub mod storage;
pub mod storage_memory;
pub mod storage_sqlite;

uniffi::include_scaffolding!("divelog");

pub use audit::{audit_log, DiveLogAuditor};
pub use config::{AuditConfig, ConfigError};
pub use error::{AuditError, FieldParseError, StoreError};
pub use models::{AuditFlag, AuditResult, ComputedMetrics, DiveLogRecord, LogId, UserId};
pub use storage::DiveLogStore;
pub use storage_memory::MemoryStore;
pub use storage_sqlite::SqliteStore;

/// Audit one log in the SQLite database at `db_path`, using thresholds from
/// `DIVELOG_AUDIT_*` environment variables.
pub fn audit_dive_log(
    db_path: String,
    user_id: String,
    log_id: String,
) -> Result<AuditResult, AuditError> {
    let auditor = DiveLogAuditor::new(AuditConfig::from_environment()?)?;
    let mut store = SqliteStore::open(&db_path)?;
    auditor.run(&mut store, &UserId(user_id), &LogId(log_id))
}

pub fn parse_duration_seconds(raw: String) -> Option<i32> {
    parse::lenient_duration_sec(&raw)
}

pub fn parse_depth_meters(raw: String) -> Option<f64> {
    parse::lenient_depth_m(&raw)
}
