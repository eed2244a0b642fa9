use divelog_audit::models::{DiveLogRecord, LogId, UserId};
use divelog_audit::storage::DiveLogStore;
use divelog_audit::{audit_dive_log, AuditError, AuditFlag, DiveLogAuditor, SqliteStore};

fn diver() -> UserId {
    UserId("diver-1".to_string())
}

fn temp_db(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "divelog-audit-{}-{}.sqlite",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn audits_and_persists_against_sqlite() {
    let user = diver();
    let id = LogId("blue-hole".to_string());
    let mut store = SqliteStore::open_in_memory().unwrap();
    store
        .insert_log(&DiveLogRecord {
            date: Some("2024-01-01".to_string()),
            discipline: Some("CWT".to_string()),
            location: Some("Blue Hole".to_string()),
            reached_depth_m: Some(100.0),
            total_time_sec: Some(240),
            bottom_time_sec: Some(10),
            ..DiveLogRecord::new(&user, &id)
        })
        .unwrap();

    let result = DiveLogAuditor::default()
        .run(&mut store, &user, &id)
        .unwrap();
    assert_eq!(result.completeness, 100);
    assert_eq!(result.risk, 33);

    let saved = store.fetch_log(&user, &id).unwrap().unwrap();
    assert_eq!(saved.descent_sec, Some(120));
    assert_eq!(saved.ascent_sec, Some(110));
    assert_eq!(saved.descent_speed_mps, Some(0.833));
    assert_eq!(saved.ascent_speed_mps, Some(0.909));

    let audit = store.fetch_audit(&user, &id).unwrap().unwrap();
    assert_eq!(audit.result, result);
    assert!(audit.computed_at_unix > 0);
}

#[test]
fn personal_best_uses_stored_history() {
    let user = diver();
    let mut store = SqliteStore::open_in_memory().unwrap();
    for (id, date, depth) in [("a", "2024-01-01", 40.0), ("b", "2024-01-05", 44.0)] {
        store
            .insert_log(&DiveLogRecord {
                date: Some(date.to_string()),
                reached_depth_m: Some(depth),
                ..DiveLogRecord::new(&user, &LogId(id.to_string()))
            })
            .unwrap();
    }
    let id = LogId("c".to_string());
    store
        .insert_log(&DiveLogRecord {
            date: Some("2024-01-09".to_string()),
            reached_depth_m: Some(47.0),
            total_time_sec: Some(120),
            ..DiveLogRecord::new(&user, &id)
        })
        .unwrap();

    let result = DiveLogAuditor::default()
        .run(&mut store, &user, &id)
        .unwrap();
    assert!(result.has_flag(AuditFlag::PersonalBest));
    assert!(result.computed.is_pb);
    assert_eq!(result.computed.depth_prev_best_m, Some(44.0));
}

#[test]
fn text_columns_feed_the_audit() {
    let user = diver();
    let id = LogId("imported".to_string());
    let mut store = SqliteStore::open_in_memory().unwrap();
    store
        .connection()
        .execute(
            "INSERT INTO dive_logs (id, user_id, reached_depth, total_time_seconds, bottom_time) \
             VALUES (?1, ?2, '30 m', '2:00', '10 s')",
            [&id.0, &user.0],
        )
        .unwrap();

    let result = DiveLogAuditor::default()
        .run(&mut store, &user, &id)
        .unwrap();
    assert_eq!(result.computed.total_time_sec, Some(120));
    assert_eq!(result.computed.bottom_time_sec, 10);
    assert_eq!(result.computed.descent_sec, Some(57));
    assert_eq!(result.computed.ascent_sec, Some(53));

    let saved = store.fetch_log(&user, &id).unwrap().unwrap();
    assert_eq!(saved.descent_sec, Some(57));
}

#[test]
fn deleting_a_log_removes_its_audit() {
    let user = diver();
    let id = LogId("short".to_string());
    let mut store = SqliteStore::open_in_memory().unwrap();
    store
        .insert_log(&DiveLogRecord {
            reached_depth_m: Some(15.0),
            ..DiveLogRecord::new(&user, &id)
        })
        .unwrap();
    divelog_audit::audit_log(&mut store, &user, &id).unwrap();
    assert!(store.fetch_audit(&user, &id).unwrap().is_some());

    assert!(store.delete_log(&user, &id).unwrap());
    assert!(store.fetch_audit(&user, &id).unwrap().is_none());
    assert!(!store.delete_log(&user, &id).unwrap());
}

#[test]
fn ffi_entry_point_reads_database_file() {
    let path = temp_db("ffi");
    let user = diver();
    let id = LogId("file-log".to_string());
    {
        let mut store = SqliteStore::open(&path).unwrap();
        store
            .insert_log(&DiveLogRecord {
                discipline: Some("FIM".to_string()),
                reached_depth_m: Some(25.0),
                total_time_sec: Some(80),
                ..DiveLogRecord::new(&user, &id)
            })
            .unwrap();
    }

    let result = audit_dive_log(
        path.to_string_lossy().into_owned(),
        user.0.clone(),
        id.0.clone(),
    )
    .unwrap();
    assert!(result.summary.starts_with("FIM at unknown location"));

    let missing = audit_dive_log(
        path.to_string_lossy().into_owned(),
        user.0.clone(),
        "nope".to_string(),
    );
    assert!(matches!(missing, Err(AuditError::NotFound { .. })));

    let reopened = SqliteStore::open(&path).unwrap();
    assert!(reopened.fetch_audit(&user, &id).unwrap().is_some());
    drop(reopened);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn ffi_parsers_are_lenient() {
    assert_eq!(divelog_audit::parse_duration_seconds("3:20".to_string()), Some(200));
    assert_eq!(divelog_audit::parse_depth_meters("45 m".to_string()), Some(45.0));
    assert_eq!(divelog_audit::parse_depth_meters("deep".to_string()), None);
}
