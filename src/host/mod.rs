//! Host interfaces for the external collaborators the engine reads from.
//!
//! Each data source consumed by a capture step is an explicit, injectable
//! trait rather than an ambient global, so tests can substitute in-memory
//! hosts ([`memory`]) and the record-database seam has a real SQLite
//! implementation ([`sqlite`]).

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::snapshot::{DebugHook, NavigationState, Viewport, WorkerRegistration};

/// Synchronous key-value store. The engine reads two instances: one
/// ephemeral (cleared at session end) and one persistent.
pub trait KeyValueStore: Send + Sync {
    /// All entries in the store's native enumeration order. The order is
    /// not guaranteed stable and must not be relied on.
    fn entries(&self) -> Result<Vec<(String, String)>>;
}

/// A record database address: name plus schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseId {
    pub name: String,
    pub version: u64,
}

/// Result of a full scan of one store inside a record database.
#[derive(Debug, Clone)]
pub struct StoreScan {
    pub key_path: Option<String>,
    pub auto_increment: bool,
    pub indexes: Vec<String>,
    pub records: Vec<Value>,
}

#[async_trait]
pub trait RecordDatabaseHost: Send + Sync {
    async fn databases(&self) -> Result<Vec<DatabaseId>>;

    async fn open(&self, id: &DatabaseId) -> Result<Box<dyn RecordDatabaseConn>>;
}

#[async_trait]
pub trait RecordDatabaseConn: Send + Sync {
    fn store_names(&self) -> Vec<String>;

    async fn scan_store(&self, store: &str) -> Result<StoreScan>;

    /// Release the underlying connection. The capture calls this on both
    /// success and failure paths so repeated runs never leak connections.
    async fn release(&self);
}

/// Request/response metadata for one cached entry, body not included.
#[derive(Debug, Clone)]
pub struct CachedRequest {
    pub url: String,
    pub method: String,
    pub request_headers: Vec<(String, String)>,
    pub status: u16,
    pub status_text: String,
    pub response_headers: Vec<(String, String)>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ResponseCacheHost: Send + Sync {
    async fn cache_names(&self) -> Result<Vec<String>>;

    async fn entries(&self, cache: &str) -> Result<Vec<CachedRequest>>;

    async fn read_body(&self, cache: &str, url: &str) -> Result<String>;
}

pub trait CookieSource: Send + Sync {
    /// The session's cookies as one delimited string.
    fn cookie_string(&self) -> Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentInfo {
    pub origin: String,
    pub viewport: Viewport,
}

/// Capability interface for runtime introspection. The host decides which
/// debug hooks and application globals exist; the engine only reads them.
pub trait RuntimeHost: Send + Sync {
    fn environment(&self) -> EnvironmentInfo;

    /// Known framework debug hooks: existence and version only.
    fn debug_hooks(&self) -> Vec<DebugHook>;

    /// Application globals by name. An access that fails carries the
    /// failure message instead of aborting the scan.
    fn app_globals(&self) -> Vec<(String, Result<Value, String>)>;

    fn navigation(&self) -> NavigationState;

    fn worker_registrations(&self) -> Vec<WorkerRegistration>;
}
