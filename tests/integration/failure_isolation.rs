//! Step failure isolation and cooperative cancellation.

use std::sync::Arc;

use parking_lot::Mutex;

use statecap::host::memory::{MemoryCacheHost, MemoryRecordHost};
use statecap::host::KeyValueStore;
use statecap::{CancelFlag, EngineError, SnapshotEngine, StepStatus};

use crate::common;

#[tokio::test]
async fn failing_step_does_not_abort_later_steps() {
    let mut deps = common::populated_deps();
    deps.caches = Arc::new(MemoryCacheHost::new().fail_listing());

    let engine = SnapshotEngine::new(deps, common::policy());
    let snapshot = engine.capture().await.unwrap();

    assert_eq!(snapshot.steps[2].name, "caches");
    assert_eq!(snapshot.steps[2].status, StepStatus::Error);
    assert!(snapshot.steps[2]
        .error
        .as_deref()
        .unwrap()
        .contains("cache listing unavailable"));

    // The failed section is substituted with an empty one.
    assert!(snapshot.caches.caches.is_empty());
    assert_eq!(snapshot.caches.stats.total, 0);

    // Earlier and later steps all ran and their results survived.
    assert_eq!(snapshot.steps[0].status, StepStatus::Complete);
    assert_eq!(snapshot.steps[1].status, StepStatus::Complete);
    for step in &snapshot.steps[3..] {
        assert_eq!(step.status, StepStatus::Complete, "step {}", step.name);
    }
    assert_eq!(snapshot.cookies.len(), 2);
    assert_eq!(snapshot.network.open_streams.len(), 1);
}

#[tokio::test]
async fn cancellation_before_the_run_stops_immediately() {
    let engine = SnapshotEngine::new(common::populated_deps(), common::policy());
    engine.cancel_flag().cancel();

    let result = engine.capture().await;
    assert!(matches!(result, Err(EngineError::Cancelled)));
}

/// A session store that requests cancellation while its own step runs.
struct CancellingStore {
    slot: Arc<Mutex<Option<CancelFlag>>>,
}

impl KeyValueStore for CancellingStore {
    fn entries(&self) -> anyhow::Result<Vec<(String, String)>> {
        if let Some(flag) = self.slot.lock().as_ref() {
            flag.cancel();
        }
        Ok(vec![("k".to_string(), "v".to_string())])
    }
}

#[tokio::test]
async fn cancellation_mid_run_skips_remaining_steps() {
    let slot = Arc::new(Mutex::new(None));
    let records = Arc::new(MemoryRecordHost::new(Vec::new()));

    let mut deps = common::populated_deps();
    deps.session_store = Arc::new(CancellingStore { slot: slot.clone() });
    deps.records = records.clone();

    let engine = SnapshotEngine::new(deps, common::policy());
    *slot.lock() = Some(engine.cancel_flag());

    // The storage step runs to completion; the cancel is observed at the
    // next step boundary and the partial snapshot is discarded.
    let result = engine.capture().await;
    assert!(matches!(result, Err(EngineError::Cancelled)));
    assert!(records.released().is_empty());
}
