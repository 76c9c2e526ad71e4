//! In-memory store backend for tests and embedding.
//!
//! BTreeMap-backed and thread-safe via RwLock. Transactions snapshot the
//! full data set at `begin` and restore it on `rollback`, which gives the
//! maintenance operations real all-or-nothing semantics to test against.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use tracing::debug;

use crate::backend::{HashCursor, StoreBackend};
use crate::error::StoreError;
use crate::hashing::HashFunction;
use crate::types::{CompressionMethod, HashEntry};

/// Method names seeded by [`MemoryStore::initialize`]. `zstd` is absent on
/// purpose: stores that predate it gain the row through a migration.
const SEED_METHODS: [&str; 2] = ["none", "lz4"];

#[derive(Debug, Clone, Default)]
struct Tables {
    options: BTreeMap<String, String>,
    methods: BTreeMap<u32, String>,
    hashes: BTreeMap<u64, Vec<u8>>,
    blocks: BTreeMap<u64, Vec<u8>>,
    block_methods: BTreeMap<u64, u32>,
    indexes: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct Inner {
    initialized: bool,
    next_method_id: u32,
    tables: Tables,
    undo: Option<Tables>,
    vacuums: u64,
}

/// BTreeMap-backed implementation of [`StoreBackend`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates a new, never-initialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the option table and method registry for a brand-new store.
    ///
    /// Safe to call once; a second call fails rather than reseeding over
    /// live data.
    pub fn initialize(&self, hash_function: HashFunction) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.initialized {
            return Err(StoreError::Backend("store already initialized".into()));
        }
        inner.initialized = true;
        inner
            .tables
            .options
            .insert("hash_function".to_string(), hash_function.to_string());
        for name in SEED_METHODS {
            let id = inner.next_method_id + 1;
            inner.next_method_id = id;
            inner.tables.methods.insert(id, name.to_string());
        }
        debug!(hash_function = %hash_function, "initialized memory store");
        Ok(())
    }

    /// Number of `vacuum` calls observed, for tests asserting that rehash
    /// compacts the hash table after a successful pass.
    pub fn vacuum_count(&self) -> u64 {
        self.inner.read().map(|i| i.vacuums).unwrap_or(0)
    }

    /// True while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.inner.read().map(|i| i.undo.is_some()).unwrap_or(false)
    }

    /// A deep snapshot of all table data, for tests comparing pre/post
    /// state bit-for-bit.
    pub fn snapshot_for_test(&self) -> impl PartialEq + std::fmt::Debug {
        #[derive(Debug, PartialEq)]
        struct Snapshot {
            options: BTreeMap<String, String>,
            methods: BTreeMap<u32, String>,
            hashes: BTreeMap<u64, Vec<u8>>,
            blocks: BTreeMap<u64, Vec<u8>>,
            block_methods: BTreeMap<u64, u32>,
            indexes: BTreeSet<String>,
        }
        let inner = self.inner.read().expect("store lock poisoned");
        let t = &inner.tables;
        Snapshot {
            options: t.options.clone(),
            methods: t.methods.clone(),
            hashes: t.hashes.clone(),
            blocks: t.blocks.clone(),
            block_methods: t.block_methods.clone(),
            indexes: t.indexes.clone(),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

impl StoreBackend for MemoryStore {
    fn is_initialized(&self) -> bool {
        self.inner.read().map(|i| i.initialized).unwrap_or(false)
    }

    fn option(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.tables.options.get(key).cloned())
    }

    fn set_option(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write()?
            .tables
            .options
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn compression_methods(&self) -> Result<Vec<CompressionMethod>, StoreError> {
        Ok(self
            .read()?
            .tables
            .methods
            .iter()
            .map(|(&id, name)| CompressionMethod {
                id,
                name: name.clone(),
            })
            .collect())
    }

    fn compression_method_name(&self, id: u32) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.tables.methods.get(&id).cloned())
    }

    fn find_compression_method(&self, name: &str) -> Result<Option<CompressionMethod>, StoreError> {
        Ok(self
            .read()?
            .tables
            .methods
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(&id, n)| CompressionMethod {
                id,
                name: n.clone(),
            }))
    }

    fn add_compression_method(&self, name: &str) -> Result<u32, StoreError> {
        let mut inner = self.write()?;
        if inner.tables.methods.values().any(|n| n == name) {
            return Err(StoreError::MethodExists(name.to_string()));
        }
        let id = inner.next_method_id + 1;
        inner.next_method_id = id;
        inner.tables.methods.insert(id, name.to_string());
        Ok(id)
    }

    fn rename_compression_method(&self, id: u32, new_name: &str) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.tables.methods.contains_key(&id) {
            return Err(StoreError::MethodNotFound(id));
        }
        if inner
            .tables
            .methods
            .iter()
            .any(|(&other, n)| other != id && n == new_name)
        {
            return Err(StoreError::MethodExists(new_name.to_string()));
        }
        inner.tables.methods.insert(id, new_name.to_string());
        Ok(())
    }

    fn hash_count(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.tables.hashes.len() as u64)
    }

    fn hash_entries(&self) -> Result<HashCursor<'_>, StoreError> {
        // Snapshot at open: rows inserted after this point are not visited.
        let rows: Vec<HashEntry> = self
            .read()?
            .tables
            .hashes
            .iter()
            .map(|(&id, hash)| HashEntry {
                id,
                hash: hash.clone(),
            })
            .collect();
        Ok(Box::new(rows.into_iter().map(Ok)))
    }

    fn insert_hash(&self, id: u64, hash: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.tables.hashes.contains_key(&id) {
            return Err(StoreError::RowExists { table: "hash", id });
        }
        inner.tables.hashes.insert(id, hash.to_vec());
        Ok(())
    }

    fn update_hash(&self, id: u64, hash: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        match inner.tables.hashes.get_mut(&id) {
            Some(slot) => {
                *slot = hash.to_vec();
                Ok(())
            }
            None => Err(StoreError::RowNotFound { table: "hash", id }),
        }
    }

    fn block(&self, id: u64) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.read()?.tables.blocks.get(&id).cloned())
    }

    fn insert_block(&self, id: u64, data: &[u8], method_id: u32) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.tables.methods.contains_key(&method_id) {
            return Err(StoreError::MethodNotFound(method_id));
        }
        if inner.tables.blocks.contains_key(&id) {
            return Err(StoreError::RowExists { table: "block", id });
        }
        inner.tables.blocks.insert(id, data.to_vec());
        inner.tables.block_methods.insert(id, method_id);
        Ok(())
    }

    fn block_compression(&self, id: u64) -> Result<Option<u32>, StoreError> {
        Ok(self.read()?.tables.block_methods.get(&id).copied())
    }

    fn begin(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.undo.is_some() {
            return Err(StoreError::TransactionActive);
        }
        inner.undo = Some(inner.tables.clone());
        Ok(())
    }

    fn commit(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.undo.take().is_none() {
            return Err(StoreError::NoTransaction);
        }
        Ok(())
    }

    fn rollback(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        match inner.undo.take() {
            Some(saved) => {
                inner.tables = saved;
                Ok(())
            }
            None => Err(StoreError::NoTransaction),
        }
    }

    fn vacuum(&self, table: &str) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.vacuums += 1;
        debug!(table, "vacuumed table");
        Ok(())
    }

    fn create_index_if_not_exists(
        &self,
        table: &str,
        index: &str,
        columns: &[&str],
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.tables.indexes.insert(index.to_string()) {
            debug!(table, index, ?columns, "created index");
        }
        Ok(())
    }

    fn drop_index(&self, index: &str) -> Result<(), StoreError> {
        self.write()?.tables.indexes.remove(index);
        Ok(())
    }
}
