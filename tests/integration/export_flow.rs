//! End-to-end capture and export.

use std::sync::Arc;

use statecap::host::sqlite::SqliteRecordHost;
use statecap::{EngineError, Exporter, SnapshotEngine};

use crate::common;

#[tokio::test]
async fn captured_snapshot_exports_as_wellformed_artifact() {
    let engine = SnapshotEngine::new(common::populated_deps(), common::policy());
    let snapshot = engine.capture().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = Exporter::new(dir.path()).export(&snapshot).unwrap();

    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("snapshot-"));
    assert!(name.ends_with(".json"));

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    for key in [
        "metadata",
        "storage",
        "indexedDB",
        "caches",
        "cookies",
        "state",
        "network",
        "steps",
    ] {
        assert!(doc.get(key).is_some(), "missing top-level key {key}");
    }

    // Entry shape uses the normative artifact field names.
    let entry = &doc["storage"]["sessionStorage"]["a"];
    assert_eq!(entry["size"], serde_json::json!(1));
    assert_eq!(entry["truncated"], serde_json::json!(false));

    // The artifact carries the policy that produced it.
    let policy = &doc["metadata"]["policy"];
    assert!(policy.get("maxRawLength").is_some());
    assert!(policy.get("allowedContentTypes").is_some());
    assert!(policy.get("maxArrayItems").is_some());

    assert_eq!(doc["steps"].as_array().unwrap().len(), 6);
    assert_eq!(doc["steps"][0]["status"], serde_json::json!("complete"));
}

#[tokio::test]
async fn engine_runs_against_a_sqlite_record_host() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE messages (id INTEGER PRIMARY KEY, body TEXT);
         INSERT INTO messages (body) VALUES ('{\"text\": \"hi\"}'), ('plain');",
    )
    .unwrap();
    drop(conn);

    let mut host = SqliteRecordHost::new();
    host.register("appdb", 1, &db_path);

    let mut deps = common::populated_deps();
    deps.records = Arc::new(host);

    let engine = SnapshotEngine::new(deps, common::policy());
    let snapshot = engine.capture().await.unwrap();

    assert_eq!(snapshot.indexed_db.len(), 1);
    let store = &snapshot.indexed_db[0].stores[0];
    assert_eq!(store.name, "messages");
    assert_eq!(store.count, 2);
    assert_eq!(store.key_path.as_deref(), Some("id"));
    assert_eq!(store.records[0]["body"], serde_json::json!({"text": "hi"}));
    assert_eq!(store.records[1]["body"], serde_json::json!("plain"));
}

#[tokio::test]
async fn export_into_unwritable_target_is_an_io_error() {
    let engine = SnapshotEngine::new(common::populated_deps(), common::policy());
    let snapshot = engine.capture().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    // Occupy the output directory path with a plain file.
    let blocked = dir.path().join("exports");
    std::fs::write(&blocked, b"not a directory").unwrap();

    let result = Exporter::new(&blocked).export(&snapshot);
    assert!(matches!(result, Err(EngineError::Io(_))));
}
