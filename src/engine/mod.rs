//! Snapshot coordinator.
//!
//! Runs the six capture sources strictly sequentially in a fixed order,
//! tracks per-step status, isolates per-step failures, and honors
//! cancellation at step boundaries. The coordinator is the sole owner of
//! the in-progress snapshot and never exposes it until final assembly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::capture::{
    CaptureSource, CookieCapture, KeyValueStoreCapture, NetworkActivityCapture, NetworkObserver,
    RecordDatabaseCapture, ResponseCacheCapture, RuntimeIntrospectionCapture,
};
use crate::error::EngineError;
use crate::host::{CookieSource, KeyValueStore, RecordDatabaseHost, ResponseCacheHost, RuntimeHost};
use crate::policy::SnapshotPolicy;
use crate::snapshot::{CaptureStepResult, Snapshot, SnapshotMeta, StepStatus};

/// Fixed step order; also the artifact's section order.
pub const CAPTURE_STEPS: [&str; 6] = [
    "storage",
    "indexedDB",
    "caches",
    "cookies",
    "state",
    "network",
];

/// Cooperative cancellation flag, checked only at step boundaries.
/// A step already in flight always runs to completion.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress and status events emitted during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    StepStarted {
        step: String,
    },
    /// Sub-step progress from a multi-step source (records, caches).
    StepProgress {
        step: String,
        completed: usize,
        total: usize,
    },
    StepFinished {
        step: String,
        status: StepStatus,
    },
    /// Overall progress after each step.
    RunProgress {
        completed: usize,
        total: usize,
    },
}

/// The engine's dependency set: every external collaborator, injected.
#[derive(Clone)]
pub struct EngineDeps {
    /// Ephemeral store, cleared at session end.
    pub session_store: Arc<dyn KeyValueStore>,
    /// Persistent store.
    pub local_store: Arc<dyn KeyValueStore>,
    pub records: Arc<dyn RecordDatabaseHost>,
    pub caches: Arc<dyn ResponseCacheHost>,
    pub cookies: Arc<dyn CookieSource>,
    pub runtime: Arc<dyn RuntimeHost>,
    /// Installed once for the page's lifetime; the capture only reads it.
    pub network: Arc<NetworkObserver>,
}

pub struct SnapshotEngine {
    deps: EngineDeps,
    policy: SnapshotPolicy,
    cancel: CancelFlag,
    events: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl SnapshotEngine {
    pub fn new(deps: EngineDeps, policy: SnapshotPolicy) -> Self {
        Self {
            deps,
            policy,
            cancel: CancelFlag::new(),
            events: None,
        }
    }

    /// Attach an event channel for progress reporting.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<EngineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Handle for requesting cancellation from the trigger surface.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn policy(&self) -> &SnapshotPolicy {
        &self.policy
    }

    /// Run all capture steps and assemble the snapshot.
    ///
    /// One failing source never aborts the run; its step is marked
    /// `error` and its section stays empty. Cancellation observed at a
    /// step boundary discards the partial snapshot.
    pub async fn capture(&self) -> Result<Snapshot, EngineError> {
        let metadata = self.metadata();
        let mut steps: Vec<CaptureStepResult> = CAPTURE_STEPS
            .iter()
            .map(|name| CaptureStepResult {
                name: name.to_string(),
                status: StepStatus::Pending,
                error: None,
            })
            .collect();
        let mut completed = 0usize;

        self.check_cancel()?;
        let storage = self
            .run_step(
                0,
                &mut steps,
                &mut completed,
                KeyValueStoreCapture::new(
                    self.deps.session_store.clone(),
                    self.deps.local_store.clone(),
                    self.policy.clone(),
                ),
            )
            .await
            .unwrap_or_default();

        self.check_cancel()?;
        let indexed_db = self
            .run_step(
                1,
                &mut steps,
                &mut completed,
                RecordDatabaseCapture::new(self.deps.records.clone()),
            )
            .await
            .unwrap_or_default();

        self.check_cancel()?;
        let caches = self
            .run_step(
                2,
                &mut steps,
                &mut completed,
                ResponseCacheCapture::new(self.deps.caches.clone(), self.policy.clone()),
            )
            .await
            .unwrap_or_default();

        self.check_cancel()?;
        let cookies = self
            .run_step(
                3,
                &mut steps,
                &mut completed,
                CookieCapture::new(self.deps.cookies.clone()),
            )
            .await
            .unwrap_or_default();

        self.check_cancel()?;
        let state = self
            .run_step(
                4,
                &mut steps,
                &mut completed,
                RuntimeIntrospectionCapture::new(self.deps.runtime.clone()),
            )
            .await
            .unwrap_or_default();

        self.check_cancel()?;
        let network = self
            .run_step(
                5,
                &mut steps,
                &mut completed,
                NetworkActivityCapture::new(self.deps.network.clone(), self.deps.runtime.clone()),
            )
            .await
            .unwrap_or_default();

        Ok(Snapshot {
            metadata,
            storage,
            indexed_db,
            caches,
            cookies,
            state,
            network,
            steps,
        })
    }

    fn metadata(&self) -> SnapshotMeta {
        let environment = self.deps.runtime.environment();
        SnapshotMeta {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            origin: environment.origin,
            viewport: environment.viewport,
            version: env!("CARGO_PKG_VERSION").to_string(),
            policy: self.policy.clone(),
        }
    }

    fn check_cancel(&self) -> Result<(), EngineError> {
        if self.cancel.is_cancelled() {
            tracing::info!("capture cancelled at step boundary");
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }

    async fn run_step<S: CaptureSource>(
        &self,
        index: usize,
        steps: &mut [CaptureStepResult],
        completed: &mut usize,
        source: S,
    ) -> Option<S::Section> {
        let name = source.name();
        steps[index].status = StepStatus::Running;
        self.emit(EngineEvent::StepStarted {
            step: name.to_string(),
        });

        let events = self.events.clone();
        let step = name.to_string();
        let progress = move |done: usize, total: usize| {
            if let Some(tx) = &events {
                let _ = tx.send(EngineEvent::StepProgress {
                    step: step.clone(),
                    completed: done,
                    total,
                });
            }
        };

        // Sources contain their own failures; this guards the rare escape.
        let section = match source.run(&progress).await {
            Ok(section) => {
                steps[index].status = StepStatus::Complete;
                Some(section)
            }
            Err(err) => {
                tracing::warn!(step = name, error = %err, "capture step failed");
                steps[index].status = StepStatus::Error;
                steps[index].error = Some(err.to_string());
                None
            }
        };

        *completed += 1;
        self.emit(EngineEvent::StepFinished {
            step: name.to_string(),
            status: steps[index].status,
        });
        self.emit(EngineEvent::RunProgress {
            completed: *completed,
            total: CAPTURE_STEPS.len(),
        });
        section
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
