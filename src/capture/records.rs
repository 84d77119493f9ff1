use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::capture::{CaptureSource, ProgressFn};
use crate::host::{DatabaseId, RecordDatabaseConn, RecordDatabaseHost};
use crate::snapshot::{RecordDatabase, RecordStore};

/// Captures every record database with a full scan of each store.
///
/// Progress is reported as `(stores completed, stores total)` across all
/// databases combined, since it drives a single visible indicator. A
/// database that fails to open is recorded and skipped; the rest proceed.
pub struct RecordDatabaseCapture {
    host: Arc<dyn RecordDatabaseHost>,
}

impl RecordDatabaseCapture {
    pub fn new(host: Arc<dyn RecordDatabaseHost>) -> Self {
        Self { host }
    }
}

struct OpenedDatabase {
    id: DatabaseId,
    conn: Option<Box<dyn RecordDatabaseConn>>,
    error: Option<String>,
}

#[async_trait]
impl CaptureSource for RecordDatabaseCapture {
    type Section = Vec<RecordDatabase>;

    fn name(&self) -> &'static str {
        "indexedDB"
    }

    async fn run(&self, progress: ProgressFn<'_>) -> Result<Vec<RecordDatabase>> {
        // Enumeration failure fails the whole step; everything below is
        // contained per database or per store.
        let ids = self.host.databases().await?;

        // Open everything up front so the combined store total is known
        // before the first scan.
        let mut opened = Vec::with_capacity(ids.len());
        for id in ids {
            match self.host.open(&id).await {
                Ok(conn) => opened.push(OpenedDatabase {
                    id,
                    conn: Some(conn),
                    error: None,
                }),
                Err(err) => {
                    tracing::warn!(database = %id.name, error = %err, "failed to open record database");
                    opened.push(OpenedDatabase {
                        id,
                        conn: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let total: usize = opened
            .iter()
            .filter_map(|db| db.conn.as_ref())
            .map(|conn| conn.store_names().len())
            .sum();
        let mut completed = 0usize;
        progress(completed, total);

        let mut databases = Vec::with_capacity(opened.len());
        for db in opened {
            let mut out = RecordDatabase {
                name: db.id.name.clone(),
                version: db.id.version,
                stores: Vec::new(),
                error: db.error,
            };

            if let Some(conn) = db.conn {
                for store in conn.store_names() {
                    match conn.scan_store(&store).await {
                        Ok(scan) => out.stores.push(RecordStore {
                            name: store,
                            key_path: scan.key_path,
                            auto_increment: scan.auto_increment,
                            indexes: scan.indexes,
                            count: scan.records.len(),
                            records: scan.records,
                        }),
                        Err(err) => {
                            tracing::warn!(
                                database = %db.id.name,
                                store = %store,
                                error = %err,
                                "store scan failed"
                            );
                            if out.error.is_none() {
                                out.error = Some(err.to_string());
                            }
                        }
                    }
                    completed += 1;
                    progress(completed, total);
                }
                // Released on success and failure paths alike, so repeated
                // runs never leak connections.
                conn.release().await;
            }

            databases.push(out);
        }

        Ok(databases)
    }
}
