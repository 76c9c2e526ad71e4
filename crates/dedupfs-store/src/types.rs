//! Typed rows for the persisted tables of the block index.

use serde::{Deserialize, Serialize};

/// A compression-method registry row.
///
/// `id` is the stable foreign key used by block metadata; `name` is mutable
/// over the store's lifetime. Retired names are soft-renamed to versioned
/// aliases (`zlib` → `zlib_v1`) rather than deleted while still referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionMethod {
    /// Stable registry id.
    pub id: u32,
    /// Current method name. At most one row per distinct name.
    pub name: String,
}

/// One row per stored unique block: the content hash under the currently
/// active hash function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashEntry {
    /// Primary key, shared with the block payload and its compression type.
    pub id: u64,
    /// Content hash of the decompressed payload.
    pub hash: Vec<u8>,
}

impl HashEntry {
    /// Render the hash as a lowercase hex string for logs and reports.
    pub fn hash_hex(&self) -> String {
        self.hash.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
