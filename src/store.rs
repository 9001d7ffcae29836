// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;

use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

/// Slot holding the current session.
pub const SESSION_KEY: &str = "examdrill.session";
/// Slot holding the history log.
pub const HISTORY_KEY: &str = "examdrill.history";

/// A synchronous key-value store. Values are overwritten wholesale.
pub trait Store {
    fn get(&self, key: &str) -> Fallible<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Fallible<()>;
    fn remove(&self, key: &str) -> Fallible<()>;
}

/// A store backed by a single-table SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema in {database_path}");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

impl Store for SqliteStore {
    fn get(&self, key: &str) -> Fallible<Option<Vec<u8>>> {
        let conn = self.acquire();
        let sql = "select value from kv where key = ?;";
        let value: Option<Vec<u8>> = conn
            .query_row(sql, [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> Fallible<()> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        let sql = "insert into kv (key, value, updated_at) values (?, ?, ?) on conflict (key) do update set value = excluded.value, updated_at = excluded.updated_at;";
        tx.execute(sql, (key, value, Timestamp::now()))?;
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Fallible<()> {
        let conn = self.acquire();
        conn.execute("delete from kv where key = ?;", [key])?;
        Ok(())
    }
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["kv"], |row| row.get(0))?;
    Ok(count > 0)
}

/// A store that lives in memory. Used in tests.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.values.lock().unwrap()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Fallible<Option<Vec<u8>>> {
        Ok(self.acquire().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Fallible<()> {
        self.acquire().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Fallible<()> {
        self.acquire().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::error::ErrorReport;

    fn exercise(store: &dyn Store) -> Fallible<()> {
        assert_eq!(store.get("a")?, None);
        store.set("a", b"one")?;
        assert_eq!(store.get("a")?, Some(b"one".to_vec()));
        store.set("a", b"two")?;
        assert_eq!(store.get("a")?, Some(b"two".to_vec()));
        store.set("b", b"three")?;
        store.remove("a")?;
        assert_eq!(store.get("a")?, None);
        assert_eq!(store.get("b")?, Some(b"three".to_vec()));
        // Removing a missing key is fine.
        store.remove("a")?;
        Ok(())
    }

    #[test]
    fn test_memory_store() -> Fallible<()> {
        exercise(&MemoryStore::new())
    }

    #[test]
    fn test_sqlite_store() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("examdrill.db");
        let path = path.to_str().ok_or_else(|| ErrorReport::new("invalid path"))?;
        exercise(&SqliteStore::new(path)?)
    }

    #[test]
    fn test_sqlite_store_reopen() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("examdrill.db");
        let path = path.to_str().ok_or_else(|| ErrorReport::new("invalid path"))?;
        {
            let store = SqliteStore::new(path)?;
            store.set(SESSION_KEY, b"{}")?;
        }
        let store = SqliteStore::new(path)?;
        assert_eq!(store.get(SESSION_KEY)?, Some(b"{}".to_vec()));
        Ok(())
    }
}
