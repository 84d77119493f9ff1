//! In-memory host implementations for deterministic testing
//!
//! Every host trait has an in-memory counterpart with configurable
//! failure injection, so engine and capture tests never touch a real
//! platform. Release tracking on the record host lets tests assert that
//! connections are released on both success and failure paths.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::host::{
    CachedRequest, CookieSource, DatabaseId, EnvironmentInfo, KeyValueStore, RecordDatabaseConn,
    RecordDatabaseHost, ResponseCacheHost, RuntimeHost, StoreScan,
};
use crate::snapshot::{DebugHook, NavigationState, Viewport, WorkerRegistration};

// ---------------------------------------------------------------------------
// key-value store

#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Vec<(String, String)>,
    fail: Option<String>,
}

impl MemoryKeyValueStore {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fail: None,
        }
    }

    /// A store whose enumeration always fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            entries: Vec::new(),
            fail: Some(message.to_string()),
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn entries(&self) -> Result<Vec<(String, String)>> {
        if let Some(message) = &self.fail {
            bail!("{message}");
        }
        Ok(self.entries.clone())
    }
}

// ---------------------------------------------------------------------------
// record database

#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub name: String,
    pub key_path: Option<String>,
    pub auto_increment: bool,
    pub indexes: Vec<String>,
    pub records: Vec<Value>,
}

impl MemoryStore {
    pub fn new(name: &str, records: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            key_path: Some("id".to_string()),
            auto_increment: false,
            indexes: Vec::new(),
            records,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    pub id: DatabaseId,
    pub stores: Vec<MemoryStore>,
}

impl MemoryDatabase {
    pub fn new(name: &str, version: u64, stores: Vec<MemoryStore>) -> Self {
        Self {
            id: DatabaseId {
                name: name.to_string(),
                version,
            },
            stores,
        }
    }
}

#[derive(Default)]
pub struct MemoryRecordHost {
    databases: Vec<MemoryDatabase>,
    fail_databases: bool,
    fail_open: HashSet<String>,
    fail_scan: HashSet<String>,
    released: Arc<Mutex<Vec<String>>>,
}

impl MemoryRecordHost {
    pub fn new(databases: Vec<MemoryDatabase>) -> Self {
        Self {
            databases,
            ..Default::default()
        }
    }

    /// Make `databases` enumeration fail.
    pub fn fail_databases(mut self) -> Self {
        self.fail_databases = true;
        self
    }

    /// Make `open` fail for the named database.
    pub fn fail_open(mut self, database: &str) -> Self {
        self.fail_open.insert(database.to_string());
        self
    }

    /// Make `scan_store` fail for the named store in any database.
    pub fn fail_scan(mut self, store: &str) -> Self {
        self.fail_scan.insert(store.to_string());
        self
    }

    /// Names of databases whose connections have been released.
    pub fn released(&self) -> Vec<String> {
        self.released.lock().clone()
    }
}

#[async_trait]
impl RecordDatabaseHost for MemoryRecordHost {
    async fn databases(&self) -> Result<Vec<DatabaseId>> {
        if self.fail_databases {
            bail!("database enumeration unavailable");
        }
        Ok(self.databases.iter().map(|db| db.id.clone()).collect())
    }

    async fn open(&self, id: &DatabaseId) -> Result<Box<dyn RecordDatabaseConn>> {
        if self.fail_open.contains(&id.name) {
            bail!("failed to open database {}", id.name);
        }
        let database = self
            .databases
            .iter()
            .find(|db| &db.id == id)
            .ok_or_else(|| anyhow!("unknown database {}", id.name))?;
        Ok(Box::new(MemoryConn {
            database: database.clone(),
            fail_scan: self.fail_scan.clone(),
            released: self.released.clone(),
        }))
    }
}

struct MemoryConn {
    database: MemoryDatabase,
    fail_scan: HashSet<String>,
    released: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl RecordDatabaseConn for MemoryConn {
    fn store_names(&self) -> Vec<String> {
        self.database.stores.iter().map(|s| s.name.clone()).collect()
    }

    async fn scan_store(&self, store: &str) -> Result<StoreScan> {
        if self.fail_scan.contains(store) {
            bail!("scan failed for store {store}");
        }
        let found = self
            .database
            .stores
            .iter()
            .find(|s| s.name == store)
            .ok_or_else(|| anyhow!("unknown store {store}"))?;
        Ok(StoreScan {
            key_path: found.key_path.clone(),
            auto_increment: found.auto_increment,
            indexes: found.indexes.clone(),
            records: found.records.clone(),
        })
    }

    async fn release(&self) {
        self.released.lock().push(self.database.id.name.clone());
    }
}

// ---------------------------------------------------------------------------
// response cache

#[derive(Default)]
pub struct MemoryCacheHost {
    caches: Vec<(String, Vec<CachedRequest>)>,
    bodies: HashMap<(String, String), String>,
    fail_body: HashSet<String>,
    fail_entries: HashSet<String>,
    fail_listing: bool,
}

impl MemoryCacheHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, name: &str, entries: Vec<CachedRequest>) -> Self {
        self.caches.push((name.to_string(), entries));
        self
    }

    pub fn with_body(mut self, cache: &str, url: &str, body: &str) -> Self {
        self.bodies
            .insert((cache.to_string(), url.to_string()), body.to_string());
        self
    }

    /// Make `read_body` fail for the given URL.
    pub fn fail_body(mut self, url: &str) -> Self {
        self.fail_body.insert(url.to_string());
        self
    }

    /// Make `entries` fail for the named cache.
    pub fn fail_entries(mut self, cache: &str) -> Self {
        self.fail_entries.insert(cache.to_string());
        self
    }

    /// Make `cache_names` fail.
    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }
}

#[async_trait]
impl ResponseCacheHost for MemoryCacheHost {
    async fn cache_names(&self) -> Result<Vec<String>> {
        if self.fail_listing {
            bail!("cache listing unavailable");
        }
        Ok(self.caches.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn entries(&self, cache: &str) -> Result<Vec<CachedRequest>> {
        if self.fail_entries.contains(cache) {
            bail!("cache {cache} unavailable");
        }
        self.caches
            .iter()
            .find(|(name, _)| name == cache)
            .map(|(_, entries)| entries.clone())
            .ok_or_else(|| anyhow!("unknown cache {cache}"))
    }

    async fn read_body(&self, cache: &str, url: &str) -> Result<String> {
        if self.fail_body.contains(url) {
            bail!("body read failed for {url}");
        }
        self.bodies
            .get(&(cache.to_string(), url.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("no body for {url}"))
    }
}

/// Convenience constructor for cache entries in tests.
pub fn cached_request(url: &str, content_type: Option<&str>) -> CachedRequest {
    CachedRequest {
        url: url.to_string(),
        method: "GET".to_string(),
        request_headers: vec![("accept".to_string(), "*/*".to_string())],
        status: 200,
        status_text: "OK".to_string(),
        response_headers: Vec::new(),
        content_type: content_type.map(|ct| ct.to_string()),
    }
}

// ---------------------------------------------------------------------------
// cookies

pub struct StaticCookieSource {
    raw: String,
    fail: bool,
}

impl StaticCookieSource {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            raw: String::new(),
            fail: true,
        }
    }
}

impl CookieSource for StaticCookieSource {
    fn cookie_string(&self) -> Result<String> {
        if self.fail {
            bail!("cookie access denied");
        }
        Ok(self.raw.clone())
    }
}

// ---------------------------------------------------------------------------
// runtime

pub struct StaticRuntimeHost {
    pub environment: EnvironmentInfo,
    pub hooks: Vec<DebugHook>,
    pub globals: Vec<(String, Result<Value, String>)>,
    pub navigation: NavigationState,
    pub workers: Vec<WorkerRegistration>,
}

impl Default for StaticRuntimeHost {
    fn default() -> Self {
        Self {
            environment: EnvironmentInfo {
                origin: "https://app.example.com".to_string(),
                viewport: Viewport {
                    width: 1280,
                    height: 720,
                },
            },
            hooks: Vec::new(),
            globals: Vec::new(),
            navigation: NavigationState::default(),
            workers: Vec::new(),
        }
    }
}

impl RuntimeHost for StaticRuntimeHost {
    fn environment(&self) -> EnvironmentInfo {
        self.environment.clone()
    }

    fn debug_hooks(&self) -> Vec<DebugHook> {
        self.hooks.clone()
    }

    fn app_globals(&self) -> Vec<(String, Result<Value, String>)> {
        self.globals.clone()
    }

    fn navigation(&self) -> NavigationState {
        self.navigation.clone()
    }

    fn worker_registrations(&self) -> Vec<WorkerRegistration> {
        self.workers.clone()
    }
}
