//! Shared test fixtures: fully-populated in-memory hosts for engine runs.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::json;

use statecap::host::memory::{
    cached_request, MemoryCacheHost, MemoryDatabase, MemoryKeyValueStore, MemoryRecordHost,
    MemoryStore, StaticCookieSource, StaticRuntimeHost,
};
use statecap::host::EnvironmentInfo;
use statecap::snapshot::{DebugHook, NavigationState, StreamStatus, Viewport, WorkerRegistration};
use statecap::{EngineDeps, NetworkObserver, SnapshotPolicy};

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

/// Install the test tracing subscriber (idempotent).
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

pub fn policy() -> SnapshotPolicy {
    SnapshotPolicy::default()
}

/// A dependency set backed by populated in-memory hosts.
pub fn populated_deps() -> EngineDeps {
    init_tracing();

    let records = MemoryRecordHost::new(vec![MemoryDatabase::new(
        "app",
        3,
        vec![MemoryStore::new(
            "threads",
            vec![json!({"id": 1, "title": "hello"}), json!({"id": 2, "title": "world"})],
        )],
    )]);

    let caches = MemoryCacheHost::new()
        .with_cache(
            "api-cache",
            vec![
                cached_request("https://app.example.com/api/user.json", Some("application/json")),
                cached_request("https://app.example.com/logo.png", Some("image/png")),
            ],
        )
        .with_body(
            "api-cache",
            "https://app.example.com/api/user.json",
            "{\"name\": \"ada\"}",
        );

    let runtime = StaticRuntimeHost {
        environment: EnvironmentInfo {
            origin: "https://app.example.com".to_string(),
            viewport: Viewport {
                width: 1440,
                height: 900,
            },
        },
        hooks: vec![DebugHook {
            name: "component-inspector".to_string(),
            version: Some("5.0.0".to_string()),
        }],
        globals: vec![
            ("appBuild".to_string(), Ok(json!("2026.08"))),
            ("appVault".to_string(), Err("permission denied".to_string())),
        ],
        navigation: NavigationState {
            path: "/inbox".to_string(),
            query: "filter=unread".to_string(),
            fragment: "top".to_string(),
            history: Some(json!({"length": 7})),
        },
        workers: vec![WorkerRegistration {
            scope: "https://app.example.com/".to_string(),
            script_url: "https://app.example.com/sw.js".to_string(),
            state: "activated".to_string(),
        }],
    };

    let network = Arc::new(NetworkObserver::new());
    let stream = network.stream_opened("wss://app.example.com/sync", Some("sync-v2".to_string()));
    network.stream_status(stream, StreamStatus::Open);
    network.request_started("req-42");

    EngineDeps {
        session_store: Arc::new(MemoryKeyValueStore::new(&[("a", "1"), ("b", "22")])),
        local_store: Arc::new(MemoryKeyValueStore::new(&[
            ("prefs", "{\"theme\": \"dark\"}"),
            ("last_seen", "2026-08-07"),
        ])),
        records: Arc::new(records),
        caches: Arc::new(caches),
        cookies: Arc::new(StaticCookieSource::new("sid=abc123; locale=en")),
        runtime: Arc::new(runtime),
        network,
    }
}
