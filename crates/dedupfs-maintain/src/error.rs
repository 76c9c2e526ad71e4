//! Error types for the maintenance subsystem.

use dedupfs_store::StoreError;

/// All errors surfaced by the maintenance operations.
///
/// Every error path out of a mutating operation leaves the store as it was
/// before the call: rehash rolls its transaction back before returning any
/// of these.
#[derive(Debug, thiserror::Error)]
pub enum MaintainError {
    /// The backing store or one of its codecs failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A block's compression-type row references a method id that is not
    /// in the registry.
    #[error("block {block_id} references unknown compression method id {method_id}")]
    UnknownCompressionMethod {
        /// Block whose metadata is inconsistent.
        block_id: u64,
        /// Dangling method id.
        method_id: u32,
    },

    /// The scan did not visit exactly the rows counted up front. The store
    /// was mutated mid-scan or the cursor malfunctioned; the operation was
    /// rolled back.
    #[error("row count mismatch: expected {expected} rows, visited {visited}")]
    RowCountMismatch {
        /// Row count captured before the cursor was opened.
        expected: u64,
        /// Rows actually visited.
        visited: u64,
    },

    /// The operation was cancelled and rolled back.
    #[error("cancelled after {visited} rows")]
    Cancelled {
        /// Rows visited before the cancellation was observed.
        visited: u64,
    },

    /// The option table records no active hash function; the store was
    /// never initialized.
    #[error("store has no active hash function recorded")]
    HashFunctionUnset,
}
