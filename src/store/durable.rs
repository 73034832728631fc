//! Durable backend backed by redb.
//!
//! Entities are keyed by id, relationships by their JSON-encoded
//! [`RelationshipKey`](crate::graph::RelationshipKey). Values are JSON
//! [`Sequenced`] records so a reload can restore encounter order.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::entity::Entity;
use crate::error::StoreError;
use crate::graph::Relationship;

use super::{GraphBackend, Sequenced, Snapshot, StoreResult};

type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

const ENTITY_TABLE: RecordTable = TableDefinition::new("entities");
const RELATIONSHIP_TABLE: RecordTable = TableDefinition::new("relationships");

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "lifegraph.redb";

/// redb-backed graph backend.
pub struct DurableBackend {
    db: Arc<Database>,
}

impl DurableBackend {
    /// Open or create the database in `data_dir`, creating both tables.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join(DB_FILE_NAME);
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        let txn = db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        for table_def in [ENTITY_TABLE, RELATIONSHIP_TABLE] {
            txn.open_table(table_def).map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
        }
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;

        Ok(Self { db: Arc::new(db) })
    }

    fn put(&self, table_def: RecordTable, key: &str, value: &[u8]) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        {
            let mut table = txn.open_table(table_def).map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
            table.insert(key, value).map_err(|e| StoreError::Redb {
                message: format!("insert failed: {e}"),
            })?;
        }
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, table_def: RecordTable) -> StoreResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Redb {
            message: format!("begin_read failed: {e}"),
        })?;
        let table = txn.open_table(table_def).map_err(|e| StoreError::Redb {
            message: format!("open_table failed: {e}"),
        })?;
        let iter = table.iter().map_err(|e| StoreError::Redb {
            message: format!("iter failed: {e}"),
        })?;

        let mut rows: Vec<Sequenced<T>> = Vec::new();
        for row in iter {
            let (_, value) = row.map_err(|e| StoreError::Redb {
                message: format!("read failed: {e}"),
            })?;
            rows.push(decode(value.value())?);
        }
        rows.sort_by_key(|r| r.seq);
        Ok(rows.into_iter().map(|r| r.record).collect())
    }
}

fn encode<T: Serialize>(seq: u64, record: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(&Sequenced { seq, record }).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<Sequenced<T>> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}

impl GraphBackend for DurableBackend {
    fn name(&self) -> &'static str {
        "redb"
    }

    fn put_entity(&self, seq: u64, entity: &Entity) -> StoreResult<()> {
        let bytes = encode(seq, entity)?;
        self.put(ENTITY_TABLE, entity.id.as_str(), &bytes)
    }

    fn put_relationship(&self, seq: u64, relationship: &Relationship) -> StoreResult<()> {
        let key = serde_json::to_string(&relationship.key).map_err(|e| {
            StoreError::Serialization {
                message: e.to_string(),
            }
        })?;
        let bytes = encode(seq, relationship)?;
        self.put(RELATIONSHIP_TABLE, &key, &bytes)
    }

    fn load(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot {
            entities: self.scan(ENTITY_TABLE)?,
            relationships: self.scan(RELATIONSHIP_TABLE)?,
        })
    }
}

impl std::fmt::Debug for DurableBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableBackend").finish()
    }
}
