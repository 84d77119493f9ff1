//! Live connection tracking and its snapshot capture.
//!
//! The observer is installed once, as early as possible, and held by the
//! engine's dependency set for the page's lifetime. The host's connection
//! entry points report into it; the capture step only reads.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::capture::{CaptureSource, ProgressFn};
use crate::host::RuntimeHost;
use crate::snapshot::{NetworkSection, StreamInfo, StreamStatus};

/// Handle for one tracked bidirectional stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamId(u64);

#[derive(Default)]
struct ObserverState {
    next_id: u64,
    streams: BTreeMap<u64, StreamInfo>,
    pending: BTreeSet<String>,
}

/// Process-wide observer of connection activity.
///
/// Purely observational: callers forward all behavior unchanged and only
/// report lifecycle events here. The capture step reads a point-in-time
/// copy and never mutates.
#[derive(Default)]
pub struct NetworkObserver {
    inner: Mutex<ObserverState>,
}

impl NetworkObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly opened stream, initially connecting.
    pub fn stream_opened(&self, url: impl Into<String>, protocol: Option<String>) -> StreamId {
        let mut state = self.inner.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.streams.insert(
            id,
            StreamInfo {
                url: url.into(),
                protocol,
                status: StreamStatus::Connecting,
            },
        );
        StreamId(id)
    }

    pub fn stream_status(&self, id: StreamId, status: StreamStatus) {
        if let Some(stream) = self.inner.lock().streams.get_mut(&id.0) {
            stream.status = status;
        }
    }

    /// Remove a closed stream from the open set.
    pub fn stream_closed(&self, id: StreamId) {
        self.inner.lock().streams.remove(&id.0);
    }

    pub fn request_started(&self, id: impl Into<String>) {
        self.inner.lock().pending.insert(id.into());
    }

    pub fn request_finished(&self, id: &str) {
        self.inner.lock().pending.remove(id);
    }

    pub fn open_streams(&self) -> Vec<StreamInfo> {
        self.inner.lock().streams.values().cloned().collect()
    }

    pub fn pending_requests(&self) -> Vec<String> {
        self.inner.lock().pending.iter().cloned().collect()
    }
}

/// Reads the observer state plus static worker-registration info.
pub struct NetworkActivityCapture {
    observer: Arc<NetworkObserver>,
    host: Arc<dyn RuntimeHost>,
}

impl NetworkActivityCapture {
    pub fn new(observer: Arc<NetworkObserver>, host: Arc<dyn RuntimeHost>) -> Self {
        Self { observer, host }
    }
}

#[async_trait]
impl CaptureSource for NetworkActivityCapture {
    type Section = NetworkSection;

    fn name(&self) -> &'static str {
        "network"
    }

    async fn run(&self, _progress: ProgressFn<'_>) -> Result<NetworkSection> {
        Ok(NetworkSection {
            open_streams: self.observer.open_streams(),
            pending_requests: self.observer.pending_requests(),
            workers: self.host.worker_registrations(),
        })
    }
}
