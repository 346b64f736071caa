//! Ordered key-value storage.
//!
//! [`KvStore`] is the storage boundary of the engine: byte keys, byte
//! values, and prefix iteration in ascending lexicographic key order.
//! [`MemStore`] is the in-memory implementation backed by a `BTreeMap`.

use std::collections::BTreeMap;

use batchdex_types::Result;
use sha2::{Digest, Sha256};

/// A key-value store with ordered prefix iteration.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Deleting a missing key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Snapshot of every entry whose key starts with `prefix`, in ascending
    /// key order. Writes made while walking the snapshot do not affect it.
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// In-memory [`KvStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// SHA-256 over every `(key, value)` pair in key order.
    ///
    /// Two stores hold identical contents exactly when their roots match.
    #[must_use]
    pub fn root_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"batchdex:store_root:v1:");
        hasher.update((self.entries.len() as u64).to_be_bytes());
        for (key, value) in &self.entries {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value);
        }
        let result = hasher.finalize();
        let mut root = [0u8; 32];
        root.copy_from_slice(&result);
        root
    }

    /// [`Self::root_hash`] as lowercase hex.
    #[must_use]
    pub fn root_hash_hex(&self) -> String {
        hex::encode(self.root_hash())
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
