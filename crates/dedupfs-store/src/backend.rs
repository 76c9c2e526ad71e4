//! Storage backend trait for the block index tables.
//!
//! Maintenance operations are written against this trait so they can run
//! over the in-memory backend in tests and over a relational backend in
//! production. The trait models exactly the four persisted tables plus the
//! option table; the filesystem-facing read/write path is not part of it.

use crate::error::StoreError;
use crate::types::{CompressionMethod, HashEntry};

/// A forward-only cursor over hash entries.
///
/// The visited set is exactly the rows that existed when the cursor was
/// opened: no row is revisited, and rows inserted afterwards are not
/// required to appear. Backends that cannot guarantee stronger isolation
/// must still guarantee this much.
pub type HashCursor<'a> = Box<dyn Iterator<Item = Result<HashEntry, StoreError>> + 'a>;

/// Table/transaction access to a block index store.
///
/// Transactions are single-level: `begin` fails while one is active, and
/// `rollback` restores every table to its `begin`-time state. Option writes
/// are autocommit — durable when `set_option` returns — so a watermark
/// update survives a later rollback of table data.
pub trait StoreBackend {
    /// True once the store has been initialized (options seeded). A store
    /// that was never initialized holds no data worth migrating.
    fn is_initialized(&self) -> bool;

    /// Read a store-level option. Returns None if the key was never set.
    fn option(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a store-level option, creating or overwriting the key.
    fn set_option(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// All compression-method registry rows, ordered by id.
    fn compression_methods(&self) -> Result<Vec<CompressionMethod>, StoreError>;

    /// Resolve a method id to its current name.
    fn compression_method_name(&self, id: u32) -> Result<Option<String>, StoreError>;

    /// Look up a registry row by its current name.
    fn find_compression_method(&self, name: &str) -> Result<Option<CompressionMethod>, StoreError>;

    /// Register a new method name. Fails if the name is already taken;
    /// the assigned id is returned and never reused.
    fn add_compression_method(&self, name: &str) -> Result<u32, StoreError>;

    /// Rename an existing method row. The id stays stable; fails if the
    /// new name is already taken by a different row.
    fn rename_compression_method(&self, id: u32, new_name: &str) -> Result<(), StoreError>;

    /// Number of hash entries currently stored.
    fn hash_count(&self) -> Result<u64, StoreError>;

    /// Open a forward-only cursor over all hash entries.
    fn hash_entries(&self) -> Result<HashCursor<'_>, StoreError>;

    /// Insert a new hash entry.
    fn insert_hash(&self, id: u64, hash: &[u8]) -> Result<(), StoreError>;

    /// Replace the hash value of an existing entry in place.
    fn update_hash(&self, id: u64, hash: &[u8]) -> Result<(), StoreError>;

    /// Fetch the (possibly compressed) block payload for an id.
    fn block(&self, id: u64) -> Result<Option<Vec<u8>>, StoreError>;

    /// Insert a block payload together with its compression-method id.
    fn insert_block(&self, id: u64, data: &[u8], method_id: u32) -> Result<(), StoreError>;

    /// The compression-method id recorded for a block.
    fn block_compression(&self, id: u64) -> Result<Option<u32>, StoreError>;

    /// Open a transaction covering all tables.
    fn begin(&self) -> Result<(), StoreError>;

    /// Commit the active transaction.
    fn commit(&self) -> Result<(), StoreError>;

    /// Roll back the active transaction, restoring every table to its
    /// `begin`-time state.
    fn rollback(&self) -> Result<(), StoreError>;

    /// Reclaim storage on a table after bulk mutation.
    fn vacuum(&self, table: &str) -> Result<(), StoreError>;

    /// Create an index if it does not already exist. Idempotent.
    fn create_index_if_not_exists(
        &self,
        table: &str,
        index: &str,
        columns: &[&str],
    ) -> Result<(), StoreError>;

    /// Drop an index. Dropping a nonexistent index is a no-op.
    fn drop_index(&self, index: &str) -> Result<(), StoreError>;
}
