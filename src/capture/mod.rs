//! Capture sources: one independently-failing unit per snapshot section.
//!
//! All sources share one contract: `run` may suspend on the host's I/O
//! boundaries but never lets an internal failure escape as anything other
//! than an `Err` the coordinator records. Sources that own multi-step
//! loops (records, caches) report `(completed, total)` sub-progress.

pub mod cache;
pub mod cookies;
pub mod network;
pub mod records;
pub mod runtime;
pub mod storage;

pub use cache::ResponseCacheCapture;
pub use cookies::CookieCapture;
pub use network::{NetworkActivityCapture, NetworkObserver, StreamId};
pub use records::RecordDatabaseCapture;
pub use runtime::RuntimeIntrospectionCapture;
pub use storage::KeyValueStoreCapture;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Sub-step progress callback: `(completed, total)` units within one source.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

#[async_trait]
pub trait CaptureSource: Send + Sync {
    type Section: Serialize + Send;

    /// Artifact section key this source populates.
    fn name(&self) -> &'static str;

    async fn run(&self, progress: ProgressFn<'_>) -> Result<Self::Section>;
}
