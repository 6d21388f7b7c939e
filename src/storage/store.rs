// BridgeStore - Persistent storage using sled
//
// Provides typed access for storing:
// - The settled chain state (accounts and height)
// - The controller deployment record
// - Operator keypairs

use crate::controller::ControllerRecord;
use crate::identity::Keypair;
use crate::settlement::{ChainSnapshot, LocalChain};
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const CHAIN: &[u8] = b"settlement:chain";
    pub const CONTROLLER_RECORD: &[u8] = b"controller:record";
    pub const IDENTITY_KEYPAIR: &[u8] = b"identity:keypair";
    pub const IDENTITY_KEYPAIR_PREFIX: &[u8] = b"identity:keypair:";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

/// Persistent store for bridge state
///
/// Uses sled for crash-safe, embedded storage. All writes are atomic per
/// key and durable after flush. Verification programs are not persisted;
/// they are code and get re-registered on a restored chain.
pub struct BridgeStore {
    db: sled::Db,
}

impl BridgeStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    // ========================================================================
    // RAW KEY-VALUE OPERATIONS
    // ========================================================================

    /// Put raw bytes
    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Get raw bytes
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    /// Delete a key
    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.db.remove(key)?;
        Ok(())
    }

    /// List all keys with a given prefix
    pub fn list_keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        let mut keys = Vec::new();
        for result in self.db.scan_prefix(prefix) {
            let (key, _) = result?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    // ========================================================================
    // CHAIN PERSISTENCE
    // ========================================================================

    /// Save the chain's account state and height
    pub fn save_chain(&self, chain: &LocalChain) -> Result<(), StoreError> {
        let snapshot = chain.snapshot();
        let bytes = postcard::to_allocvec(&snapshot)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(keys::CHAIN, &bytes)
    }

    /// Load the chain. The returned chain has an empty program registry;
    /// callers re-register their programs before applying transactions.
    pub fn load_chain(&self) -> Result<Option<LocalChain>, StoreError> {
        match self.get_raw(keys::CHAIN)? {
            Some(bytes) => {
                let snapshot: ChainSnapshot = postcard::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(LocalChain::restore(snapshot)))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // CONTROLLER RECORD PERSISTENCE
    // ========================================================================

    /// Save the controller deployment record
    pub fn save_controller_record(&self, record: &ControllerRecord) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(record)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(keys::CONTROLLER_RECORD, &bytes)
    }

    /// Load the controller deployment record
    pub fn load_controller_record(&self) -> Result<Option<ControllerRecord>, StoreError> {
        match self.get_raw(keys::CONTROLLER_RECORD)? {
            Some(bytes) => {
                let record = postcard::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // IDENTITY PERSISTENCE
    // ========================================================================

    /// Save the operator keypair
    pub fn save_keypair(&self, keypair: &Keypair) -> Result<(), StoreError> {
        self.put_raw(keys::IDENTITY_KEYPAIR, &keypair.to_bytes())
    }

    /// Load the operator keypair
    pub fn load_keypair(&self) -> Result<Option<Keypair>, StoreError> {
        match self.get_raw(keys::IDENTITY_KEYPAIR)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// Save a keypair under a label
    pub fn save_keypair_with_label(&self, keypair: &Keypair, label: &str) -> Result<(), StoreError> {
        let key = [keys::IDENTITY_KEYPAIR_PREFIX, label.as_bytes()].concat();
        self.put_raw(&key, &keypair.to_bytes())
    }

    /// Load a keypair by label
    pub fn load_keypair_with_label(&self, label: &str) -> Result<Option<Keypair>, StoreError> {
        let key = [keys::IDENTITY_KEYPAIR_PREFIX, label.as_bytes()].concat();
        match self.get_raw(&key)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// List all labels keypairs are stored under
    pub fn list_keypair_labels(&self) -> Result<Vec<String>, StoreError> {
        let mut labels = Vec::new();
        for key in self.list_keys_with_prefix(keys::IDENTITY_KEYPAIR_PREFIX)? {
            let label = key[keys::IDENTITY_KEYPAIR_PREFIX.len()..].to_vec();
            labels.push(String::from_utf8_lossy(&label).into_owned());
        }
        Ok(labels)
    }
}
