//! Pluggable storage backend for the raw `(id -> encoded IndexRecord)`
//! mapping. Grounded on the teacher's `index::backend` module: a trait plus
//! a config enum that dispatches to a concrete backend at construction
//! time.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::IndexError;

pub mod redb_backend;

/// Storage backend for raw encoded records, keyed by id.
pub trait IndexBackend: Send + Sync {
    fn put(&self, id: &str, bytes: &[u8]) -> Result<(), IndexError>;
    fn get(&self, id: &str) -> Result<Option<Vec<u8>>, IndexError>;
    fn delete(&self, id: &str) -> Result<(), IndexError>;
    fn scan(&self) -> Result<Vec<(String, Vec<u8>)>, IndexError>;
    fn len(&self) -> Result<usize, IndexError>;
    fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }
    fn flush(&self) -> Result<(), IndexError>;
}

/// Which concrete backend to construct.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Embedded, pure-Rust, ACID key-value database on disk.
    Redb(PathBuf),
    /// Volatile in-process map; used for tests and ephemeral matching.
    InMemory,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::InMemory
    }
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb(path: impl Into<PathBuf>) -> Self {
        BackendConfig::Redb(path.into())
    }

    pub fn build(&self) -> Result<Box<dyn IndexBackend>, IndexError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::default())),
            BackendConfig::Redb(path) => Ok(Box::new(redb_backend::RedbBackend::open(path)?)),
        }
    }
}

#[derive(Default)]
pub struct InMemoryBackend {
    map: RwLock<HashMap<String, Vec<u8>>>,
}

impl IndexBackend for InMemoryBackend {
    fn put(&self, id: &str, bytes: &[u8]) -> Result<(), IndexError> {
        self.map
            .write()
            .map_err(|_| IndexError::backend("in-memory backend lock poisoned"))?
            .insert(id.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Vec<u8>>, IndexError> {
        Ok(self
            .map
            .read()
            .map_err(|_| IndexError::backend("in-memory backend lock poisoned"))?
            .get(id)
            .cloned())
    }

    fn delete(&self, id: &str) -> Result<(), IndexError> {
        self.map
            .write()
            .map_err(|_| IndexError::backend("in-memory backend lock poisoned"))?
            .remove(id);
        Ok(())
    }

    fn scan(&self) -> Result<Vec<(String, Vec<u8>)>, IndexError> {
        Ok(self
            .map
            .read()
            .map_err(|_| IndexError::backend("in-memory backend lock poisoned"))?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn len(&self) -> Result<usize, IndexError> {
        Ok(self
            .map
            .read()
            .map_err(|_| IndexError::backend("in-memory backend lock poisoned"))?
            .len())
    }

    fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}
