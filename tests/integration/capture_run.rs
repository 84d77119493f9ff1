//! Full engine runs against populated in-memory hosts.

use statecap::{EngineEvent, SnapshotEngine, StepStatus, CAPTURE_STEPS};
use tokio::sync::mpsc;

use crate::common;

#[tokio::test]
async fn full_run_populates_every_section() {
    let engine = SnapshotEngine::new(common::populated_deps(), common::policy());
    let snapshot = engine.capture().await.unwrap();

    assert_eq!(snapshot.metadata.origin, "https://app.example.com");
    assert_eq!(snapshot.metadata.viewport.width, 1440);
    assert_eq!(snapshot.metadata.version, env!("CARGO_PKG_VERSION"));

    assert_eq!(snapshot.storage.session_storage.len(), 2);
    assert_eq!(snapshot.storage.size.session, 3);
    assert_eq!(snapshot.storage.local_storage.len(), 2);
    // JSON values in storage are parsed.
    assert!(snapshot.storage.local_storage["prefs"].parsed.is_some());

    assert_eq!(snapshot.indexed_db.len(), 1);
    assert_eq!(snapshot.indexed_db[0].name, "app");
    assert_eq!(snapshot.indexed_db[0].stores[0].count, 2);

    assert_eq!(snapshot.caches.stats.total, 2);
    assert_eq!(snapshot.caches.stats.downloaded, 1);
    assert_eq!(snapshot.caches.stats.skipped, 1);

    assert_eq!(snapshot.cookies.len(), 2);
    assert_eq!(snapshot.cookies[0].name, "sid");

    assert_eq!(snapshot.state.frameworks[0].name, "component-inspector");
    assert_eq!(
        snapshot.state.globals["appVault"],
        serde_json::json!("[unavailable: permission denied]")
    );
    assert_eq!(snapshot.state.navigation.path, "/inbox");

    assert_eq!(snapshot.network.open_streams.len(), 1);
    assert_eq!(snapshot.network.pending_requests, vec!["req-42".to_string()]);
    assert_eq!(snapshot.network.workers.len(), 1);

    assert_eq!(snapshot.steps.len(), CAPTURE_STEPS.len());
    assert!(snapshot
        .steps
        .iter()
        .all(|step| step.status == StepStatus::Complete));
}

#[tokio::test]
async fn events_report_steps_in_declared_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = SnapshotEngine::new(common::populated_deps(), common::policy()).with_events(tx);
    engine.capture().await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    let started: Vec<String> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::StepStarted { step } => Some(step.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(started, CAPTURE_STEPS.map(String::from).to_vec());

    // Overall progress ends at steps-complete / steps-total.
    let last_run_progress = events
        .iter()
        .rev()
        .find_map(|event| match event {
            EngineEvent::RunProgress { completed, total } => Some((*completed, *total)),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_run_progress, (CAPTURE_STEPS.len(), CAPTURE_STEPS.len()));

    // Sub-step progress from the record scan flows through the same channel.
    assert!(events.iter().any(|event| matches!(
        event,
        EngineEvent::StepProgress { step, .. } if step == "indexedDB"
    )));
}
