use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::capture::{CaptureSource, ProgressFn};
use crate::host::KeyValueStore;
use crate::policy::SnapshotPolicy;
use crate::snapshot::{StorageSection, StoreStats};
use crate::value::{process, ValueEntry};

/// Captures the two parallel key-value stores (ephemeral and persistent),
/// running every value through the value processor.
pub struct KeyValueStoreCapture {
    session: Arc<dyn KeyValueStore>,
    local: Arc<dyn KeyValueStore>,
    policy: SnapshotPolicy,
}

impl KeyValueStoreCapture {
    pub fn new(
        session: Arc<dyn KeyValueStore>,
        local: Arc<dyn KeyValueStore>,
        policy: SnapshotPolicy,
    ) -> Self {
        Self {
            session,
            local,
            policy,
        }
    }

    fn capture_store(
        &self,
        store: &dyn KeyValueStore,
        scope: &str,
    ) -> (BTreeMap<String, ValueEntry>, StoreStats, usize) {
        let entries = match store.entries() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(scope, error = %err, "key-value store enumeration failed");
                return (BTreeMap::new(), StoreStats::default(), 0);
            }
        };

        let mut map = BTreeMap::new();
        let mut stats = StoreStats::default();
        let mut bytes = 0usize;
        for (key, raw) in entries {
            let entry = process(&raw, &self.policy);
            stats.total += 1;
            if entry.truncated {
                stats.truncated += 1;
            }
            bytes += entry.size;
            map.insert(key, entry);
        }
        (map, stats, bytes)
    }
}

#[async_trait]
impl CaptureSource for KeyValueStoreCapture {
    type Section = StorageSection;

    fn name(&self) -> &'static str {
        "storage"
    }

    async fn run(&self, _progress: ProgressFn<'_>) -> Result<StorageSection> {
        let mut section = StorageSection::default();

        let (map, stats, bytes) = self.capture_store(self.local.as_ref(), "local");
        section.local_storage = map;
        section.stats.local = stats;
        section.size.local = bytes;

        let (map, stats, bytes) = self.capture_store(self.session.as_ref(), "session");
        section.session_storage = map;
        section.stats.session = stats;
        section.size.session = bytes;

        Ok(section)
    }
}
