use super::*;
use tempfile::TempDir;

#[test]
fn test_new_session_has_identity() {
    let store = SessionStore::new();
    assert!(!store.session_id().is_empty());
    assert!(store.started_at() > 0);
}

#[test]
fn test_set_get_default() {
    let mut store = SessionStore::new();
    store.set("session:mode", "normal");
    assert_eq!(store.get("session:mode", "x"), "normal");
    assert_eq!(store.get("session:missing", "fallback"), "fallback");
}

#[test]
fn test_increment_and_decrement() {
    let mut store = SessionStore::new();
    assert_eq!(store.increment("metrics:ops", 1).unwrap(), 1);
    assert_eq!(store.increment("metrics:ops", 5).unwrap(), 6);
    assert_eq!(store.decrement("metrics:ops", 2).unwrap(), 4);
}

#[test]
fn test_increment_non_numeric_fails() {
    let mut store = SessionStore::new();
    store.set("metrics:bad", "not a number");
    let err = store.increment("metrics:bad", 1).unwrap_err();
    assert!(matches!(err, SessionError::InvalidType { .. }));
}

#[test]
fn test_append() {
    let mut store = SessionStore::new();
    store.append("session:log", "first");
    store.append("session:log", "second");
    assert_eq!(store.get("session:log", ""), "first\nsecond");
}

#[test]
fn test_clear_preserves_identity() {
    let mut store = SessionStore::new();
    let id = store.session_id().to_string();
    let started = store.started_at();
    store.set("metrics:ops", "9");
    store.track_event("test", "data").unwrap();

    store.clear();

    assert_eq!(store.session_id(), id);
    assert_eq!(store.started_at(), started);
    assert!(!store.exists("metrics:ops"));
    assert!(store.keys("events:").is_empty());
}

#[test]
fn test_track_event_counter_is_monotonic() {
    let mut store = SessionStore::new();
    store.track_event("bash_operation", "ls").unwrap();
    store.track_event("write_operation", "/tmp/x").unwrap();
    store.track_event("bash_operation", "pwd").unwrap();

    assert_eq!(store.get("metrics:event_count", "0"), "3");
    let events = store.keys("events:");
    assert_eq!(events.len(), 3);
    // Zero-padded counters sort lexicographically in order.
    assert!(events[0] < events[1] && events[1] < events[2]);
    assert!(events[0].ends_with("_bash_operation"));

    let value = store.get(&events[0], "");
    let mut parts = value.splitn(3, '|');
    assert!(parts.next().unwrap().parse::<i64>().is_ok());
    assert_eq!(parts.next().unwrap(), "bash_operation");
    assert_eq!(parts.next().unwrap(), "ls");
}

#[test]
fn test_violation_score_accumulates() {
    let mut store = SessionStore::new();
    use wow_core::Severity;
    store.record_violation(Severity::Warn);
    let score = store.record_violation(Severity::Blocked);
    assert!((score - 35.0).abs() < f64::EPSILON);
    // No time has passed, decay is a no-op.
    assert!((store.decayed_score(0.95) - 35.0).abs() < 0.01);
}

#[test]
fn test_decayed_score_without_violations_is_zero() {
    let store = SessionStore::new();
    assert!((store.decayed_score(0.95)).abs() < f64::EPSILON);
}

#[test]
fn test_save_and_load_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("current-session.state");

    let mut store = SessionStore::new();
    store.set("session:mode", "strict");
    store.set("metrics:ops", "3");
    store.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# wow-system session state"));
    // Values are base64, not plaintext.
    assert!(!text.contains("=strict"));

    let mut restored = SessionStore::new();
    restored.load(&path).unwrap();
    assert_eq!(restored.get("session:mode", ""), "strict");
    assert_eq!(restored.get("metrics:ops", ""), "3");
}

#[test]
fn test_restore_adopts_saved_identity() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("s.state");

    let mut original = SessionStore::new();
    original.set("metrics:ops", "7");
    original.save(&path).unwrap();

    let restored = SessionStore::restore(&path).unwrap();
    assert_eq!(restored.session_id(), original.session_id());
    assert_eq!(restored.started_at(), original.started_at());
    assert_eq!(restored.get("metrics:ops", ""), "7");
}

#[test]
fn test_restore_fills_missing_identity() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("s.state");
    std::fs::write(&path, "metrics:ops=Mw==\n").unwrap();

    let restored = SessionStore::restore(&path).unwrap();
    assert!(!restored.session_id().is_empty());
    assert!(restored.started_at() > 0);
    assert_eq!(restored.get("metrics:ops", ""), "3");
}

#[test]
fn test_load_preserves_live_identity() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("s.state");

    let old = SessionStore::new();
    old.save(&path).unwrap();

    let mut live = SessionStore::new();
    let live_id = live.session_id().to_string();
    live.load(&path).unwrap();
    assert_eq!(live.session_id(), live_id);
}

#[test]
fn test_load_skips_comments_and_garbage() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("s.state");
    std::fs::write(
        &path,
        "# header\n\nnot-a-pair\nsession:mode=c3RyaWN0\nbad:b64=!!!\n",
    )
    .unwrap();

    let mut store = SessionStore::new();
    let loaded = store.load(&path).unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(store.get("session:mode", ""), "strict");
    assert!(!store.exists("bad:b64"));
}

#[test]
fn test_save_handles_multiline_values() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("s.state");

    let mut store = SessionStore::new();
    store.append("session:log", "line one");
    store.append("session:log", "line two");
    store.save(&path).unwrap();

    let mut restored = SessionStore::new();
    restored.load(&path).unwrap();
    assert_eq!(restored.get("session:log", ""), "line one\nline two");
}

#[test]
fn test_archive_uses_session_id() {
    let tmp = TempDir::new().unwrap();
    let store = SessionStore::new();
    let path = store.archive(tmp.path()).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        format!("{}.state", store.session_id())
    );
    assert!(path.is_file());
}

#[test]
fn test_no_temp_files_left_after_save() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("s.state");
    SessionStore::new().save(&path).unwrap();
    let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().contains("tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
