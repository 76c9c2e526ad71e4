#![warn(missing_docs)]

//! DedupFS store subsystem: typed table access over the block index,
//! option-table handling, the compression-method registry, and the
//! content-hash capability.
//!
//! Maintenance code consumes the store exclusively through the
//! [`StoreBackend`] trait; [`MemoryStore`] is the embedded backend used by
//! tests and tooling.

pub mod backend;
pub mod compression;
pub mod error;
pub mod hashing;
pub mod memory;
pub mod options;
pub mod types;

pub use backend::{HashCursor, StoreBackend};
pub use compression::{compress, decompress, decompress_method, CompressionCodec};
pub use error::StoreError;
pub use hashing::HashFunction;
pub use memory::MemoryStore;
pub use options::{StoreOptions, OPT_HASH_FUNCTION, OPT_MIGRATION};
pub use types::{CompressionMethod, HashEntry};
