//! Redb-backed [`IndexBackend`]. Grounded on the teacher's
//! `index::backend::redb` module: a single table of raw bytes keyed by id,
//! ACID transactions handling their own locking.
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use super::IndexBackend;
use crate::error::IndexError;

const RECORDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memex_index_records");

pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let db = Database::create(path).map_err(|e| IndexError::backend(e.to_string()))?;

        let write_txn = db.begin_write().map_err(|e| IndexError::backend(e.to_string()))?;
        {
            let _table = write_txn
                .open_table(RECORDS_TABLE)
                .map_err(|e| IndexError::backend(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| IndexError::backend(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl IndexBackend for RedbBackend {
    fn put(&self, id: &str, bytes: &[u8]) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(|e| IndexError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(RECORDS_TABLE)
                .map_err(|e| IndexError::backend(e.to_string()))?;
            table
                .insert(id, bytes)
                .map_err(|e| IndexError::backend(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| IndexError::backend(e.to_string()))?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let read_txn = self.db.begin_read().map_err(|e| IndexError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(RECORDS_TABLE)
            .map_err(|e| IndexError::backend(e.to_string()))?;
        match table.get(id).map_err(|e| IndexError::backend(e.to_string()))? {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn delete(&self, id: &str) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(|e| IndexError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(RECORDS_TABLE)
                .map_err(|e| IndexError::backend(e.to_string()))?;
            table.remove(id).map_err(|e| IndexError::backend(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| IndexError::backend(e.to_string()))?;
        Ok(())
    }

    fn scan(&self) -> Result<Vec<(String, Vec<u8>)>, IndexError> {
        let read_txn = self.db.begin_read().map_err(|e| IndexError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(RECORDS_TABLE)
            .map_err(|e| IndexError::backend(e.to_string()))?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(|e| IndexError::backend(e.to_string()))? {
            let (k, v) = entry.map_err(|e| IndexError::backend(e.to_string()))?;
            out.push((k.value().to_string(), v.value().to_vec()));
        }
        Ok(out)
    }

    fn len(&self) -> Result<usize, IndexError> {
        let read_txn = self.db.begin_read().map_err(|e| IndexError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(RECORDS_TABLE)
            .map_err(|e| IndexError::backend(e.to_string()))?;
        Ok(table.len().map_err(|e| IndexError::backend(e.to_string()))? as usize)
    }

    fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}
