//! Artifact data model.
//!
//! Field names here are normative for the exported document: the
//! downstream analysis tooling addresses sections and entries by these
//! exact keys, so renames are part of the wire contract.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::policy::SnapshotPolicy;
use crate::value::ValueEntry;

/// The root artifact produced by one engine run.
///
/// Created at trigger time, populated incrementally as each capture step
/// completes, frozen at export. The engine never persists it; the exported
/// file is the only durable copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMeta,
    pub storage: StorageSection,
    #[serde(rename = "indexedDB")]
    pub indexed_db: Vec<RecordDatabase>,
    pub caches: CachesSection,
    pub cookies: Vec<CookieEntry>,
    pub state: StateSection,
    pub network: NetworkSection,
    pub steps: Vec<CaptureStepResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub origin: String,
    pub viewport: Viewport,
    /// Engine version that produced the artifact.
    pub version: String,
    /// The policy parameters in effect for this run, embedded so the
    /// artifact is interpretable without the engine's configuration.
    pub policy: SnapshotPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

// ---------------------------------------------------------------------------
// storage

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(rename = "localStorage")]
    pub local_storage: BTreeMap<String, ValueEntry>,
    #[serde(rename = "sessionStorage")]
    pub session_storage: BTreeMap<String, ValueEntry>,
    pub stats: StorageStats,
    pub size: StorageSize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub local: StoreStats,
    pub session: StoreStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total: usize,
    pub truncated: usize,
}

/// Byte totals per store, computed from raw value sizes before truncation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSize {
    pub local: usize,
    pub session: usize,
}

// ---------------------------------------------------------------------------
// indexedDB

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDatabase {
    pub name: String,
    pub version: u64,
    pub stores: Vec<RecordStore>,
    /// Set when the database could not be opened or a store scan failed;
    /// sibling databases are unaffected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStore {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    pub auto_increment: bool,
    pub indexes: Vec<String>,
    pub records: Vec<Value>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// caches

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachesSection {
    pub caches: Vec<CacheGroup>,
    pub stats: CacheStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheGroup {
    pub name: String,
    pub entries: Vec<CacheEntry>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<CachedResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Byte length of the stored body (post-truncation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_truncated: Option<bool>,
    /// Full byte length of the body, present only when truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_skipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// Read failure for this entry only; siblings are unaffected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_error: Option<String>,
}

// ---------------------------------------------------------------------------
// cookies

/// One cookie, unprocessed and unbounded (platform-bounded already).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieEntry {
    pub name: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// state

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSection {
    pub frameworks: Vec<DebugHook>,
    pub globals: BTreeMap<String, Value>,
    pub navigation: NavigationState,
}

/// Presence-only detection of a framework debug hook. Never the hook's
/// internal object graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugHook {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub path: String,
    pub query: String,
    pub fragment: String,
    /// Opaque history payload as reported by the host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Value>,
}

// ---------------------------------------------------------------------------
// network

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSection {
    pub open_streams: Vec<StreamInfo>,
    pub pending_requests: Vec<String>,
    pub workers: Vec<WorkerRegistration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub status: StreamStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Connecting,
    Open,
    Closing,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRegistration {
    pub scope: String,
    pub script_url: String,
    pub state: String,
}

// ---------------------------------------------------------------------------
// steps

/// Per-step outcome, owned exclusively by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStepResult {
    pub name: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Complete,
    Error,
}
