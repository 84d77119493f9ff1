//! SQLite-backed record database host.
//!
//! Each registered SQLite file is exposed as one record database: tables
//! become stores, rows become JSON records keyed by column name. Text
//! columns holding JSON documents are parsed so schema-less payloads
//! survive the round trip; blob columns are base64-encoded.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::host::{DatabaseId, RecordDatabaseConn, RecordDatabaseHost, StoreScan};

#[derive(Default)]
pub struct SqliteRecordHost {
    databases: Vec<(DatabaseId, PathBuf)>,
}

impl SqliteRecordHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a SQLite file under a database name and version.
    pub fn register(&mut self, name: &str, version: u64, path: impl Into<PathBuf>) {
        self.databases.push((
            DatabaseId {
                name: name.to_string(),
                version,
            },
            path.into(),
        ));
    }
}

#[async_trait]
impl RecordDatabaseHost for SqliteRecordHost {
    async fn databases(&self) -> Result<Vec<DatabaseId>> {
        Ok(self.databases.iter().map(|(id, _)| id.clone()).collect())
    }

    async fn open(&self, id: &DatabaseId) -> Result<Box<dyn RecordDatabaseConn>> {
        let (_, path) = self
            .databases
            .iter()
            .find(|(known, _)| known == id)
            .with_context(|| format!("unknown record database {}", id.name))?;

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        // Captures are read-only by contract.
        conn.execute_batch("PRAGMA query_only = ON;")?;

        let stores = list_tables(&conn)?;
        Ok(Box::new(SqliteConn {
            conn: Mutex::new(Some(conn)),
            stores,
        }))
    }
}

struct SqliteConn {
    conn: Mutex<Option<Connection>>,
    stores: Vec<String>,
}

#[async_trait]
impl RecordDatabaseConn for SqliteConn {
    fn store_names(&self) -> Vec<String> {
        self.stores.clone()
    }

    async fn scan_store(&self, store: &str) -> Result<StoreScan> {
        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| anyhow!("connection already released"))?;
        scan_table(conn, store)
    }

    async fn release(&self) {
        // Dropping the connection closes it.
        self.conn.lock().take();
    }
}

fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

fn scan_table(conn: &Connection, table: &str) -> Result<StoreScan> {
    let key_path = primary_key_path(conn, table)?;
    let auto_increment = key_path.is_none() || has_sequence(conn, table);
    let indexes = index_names(conn, table)?;
    let records = read_records(conn, table)?;
    Ok(StoreScan {
        key_path,
        auto_increment,
        indexes,
        records,
    })
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn primary_key_path(conn: &Connection, table: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let mut columns = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>(5)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    columns.retain(|(pk, _)| *pk > 0);
    columns.sort_by_key(|(pk, _)| *pk);

    if columns.is_empty() {
        return Ok(None);
    }
    let joined = columns
        .into_iter()
        .map(|(_, name)| name)
        .collect::<Vec<_>>()
        .join(",");
    Ok(Some(joined))
}

fn has_sequence(conn: &Connection, table: &str) -> bool {
    // sqlite_sequence only exists once an AUTOINCREMENT table is created.
    conn.query_row(
        "SELECT count(*) FROM sqlite_sequence WHERE name = ?1",
        [table],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n > 0)
    .unwrap_or(false)
}

fn index_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", quote_ident(table)))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names
        .into_iter()
        .filter(|name| !name.starts_with("sqlite_autoindex_"))
        .collect())
}

fn read_records(conn: &Connection, table: &str) -> Result<Vec<Value>> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
    let column_names: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let mut records = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut record = Map::new();
        for (i, name) in column_names.iter().enumerate() {
            record.insert(name.clone(), column_value(row.get_ref(i)?));
        }
        records.push(Value::Object(record));
    }
    Ok(records)
}

fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(text) => {
            let text = String::from_utf8_lossy(text).into_owned();
            // Schema-less payloads live in JSON text columns.
            let trimmed = text.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                if let Ok(parsed) = serde_json::from_str::<Value>(&text) {
                    return parsed;
                }
            }
            Value::String(text)
        }
        ValueRef::Blob(blob) => Value::String(BASE64.encode(blob)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed_database(path: &std::path::Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE items (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL,
                 payload TEXT,
                 data BLOB
             );
             CREATE INDEX idx_items_name ON items(name);
             INSERT INTO items (name, payload, data) VALUES
                 ('first', '{\"tags\": [\"a\", \"b\"]}', x'0102'),
                 ('second', NULL, NULL);",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn scans_tables_as_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        seed_database(&path);

        let mut host = SqliteRecordHost::new();
        host.register("appdb", 1, &path);

        let ids = host.databases().await.unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].name, "appdb");

        let conn = host.open(&ids[0]).await.unwrap();
        assert_eq!(conn.store_names(), vec!["items".to_string()]);

        let scan = conn.scan_store("items").await.unwrap();
        assert_eq!(scan.key_path.as_deref(), Some("id"));
        assert!(scan.auto_increment);
        assert_eq!(scan.indexes, vec!["idx_items_name".to_string()]);
        assert_eq!(scan.records.len(), 2);
        assert_eq!(scan.records[0]["name"], json!("first"));
        assert_eq!(scan.records[0]["payload"], json!({"tags": ["a", "b"]}));
        assert_eq!(scan.records[0]["data"], json!("AQI="));
        assert_eq!(scan.records[1]["payload"], Value::Null);

        conn.release().await;
    }

    #[tokio::test]
    async fn scan_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        seed_database(&path);

        let mut host = SqliteRecordHost::new();
        host.register("appdb", 1, &path);
        let id = DatabaseId {
            name: "appdb".to_string(),
            version: 1,
        };
        let conn = host.open(&id).await.unwrap();
        conn.release().await;
        assert!(conn.scan_store("items").await.is_err());
    }

    #[tokio::test]
    async fn unknown_database_is_an_error() {
        let host = SqliteRecordHost::new();
        let id = DatabaseId {
            name: "missing".to_string(),
            version: 1,
        };
        assert!(host.open(&id).await.is_err());
    }
}
