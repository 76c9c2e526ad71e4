//! Error types for the dedupfs-store subsystem

/// All errors that can occur while accessing the backing store or its codecs.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A transaction was opened while another one is still active.
    #[error("transaction already active")]
    TransactionActive,

    /// Commit or rollback was requested with no transaction open.
    #[error("no active transaction")]
    NoTransaction,

    /// A compression-method row with the given name already exists.
    #[error("compression method '{0}' already registered")]
    MethodExists(String),

    /// The compression-method id is not present in the registry.
    #[error("compression method id {0} not found")]
    MethodNotFound(u32),

    /// A row insert collided with an existing primary key.
    #[error("row {id} already exists in table '{table}'")]
    RowExists {
        /// Table the insert targeted.
        table: &'static str,
        /// Colliding primary key.
        id: u64,
    },

    /// An update targeted a row that does not exist.
    #[error("row {id} not found in table '{table}'")]
    RowNotFound {
        /// Table the update targeted.
        table: &'static str,
        /// Missing primary key.
        id: u64,
    },

    /// Compression failed.
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// Decompression failed — the payload is truncated or corrupt.
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// A registry name does not resolve to any known codec.
    #[error("no codec for compression method '{0}'")]
    UnknownMethod(String),

    /// A hash-function name does not resolve to any known function.
    #[error("unknown hash function '{0}'")]
    UnknownHashFunction(String),

    /// The backing store itself failed (lock poisoning, I/O, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}
