//! The shipped schema history.
//!
//! Every migration here is idempotent: it checks for already-applied state
//! and no-ops, so a re-run after a lost watermark write is harmless.

use dedupfs_store::StoreBackend;
use tracing::info;

use crate::migration::{run_in_transaction, MigrationFailure, StoreMigration};

/// Dedup lookups predate the index on the hash column; older stores scan.
struct AddHashValueIndex;

impl StoreMigration for AddHashValueIndex {
    fn name(&self) -> &'static str {
        "0001_add_hash_value_index"
    }

    fn apply(&self, store: &dyn StoreBackend) -> Result<(), MigrationFailure> {
        run_in_transaction(store, |s| {
            s.create_index_if_not_exists("hash", "idx_hash_value", &["hash"])?;
            Ok(())
        })
    }
}

/// Stores created before zstd support lack its registry row.
struct RegisterZstdMethod;

impl StoreMigration for RegisterZstdMethod {
    fn name(&self) -> &'static str {
        "0002_register_zstd_method"
    }

    fn apply(&self, store: &dyn StoreBackend) -> Result<(), MigrationFailure> {
        run_in_transaction(store, |s| {
            if s.find_compression_method("zstd")?.is_none() {
                let id = s.add_compression_method("zstd")?;
                info!(method_id = id, "registered zstd compression method");
            }
            Ok(())
        })
    }
}

/// zlib was retired as a write codec. Its registry row is soft-renamed to
/// a versioned legacy alias instead of deleted: blocks written under it
/// still reference the row and still decode through the alias.
struct RetireZlibMethod;

impl StoreMigration for RetireZlibMethod {
    fn name(&self) -> &'static str {
        "0003_retire_zlib_method"
    }

    fn apply(&self, store: &dyn StoreBackend) -> Result<(), MigrationFailure> {
        run_in_transaction(store, |s| {
            if let Some(method) = s.find_compression_method("zlib")? {
                s.rename_compression_method(method.id, "zlib_v1")?;
                info!(method_id = method.id, "retired zlib method as zlib_v1");
            }
            Ok(())
        })
    }
}

/// The shipped migrations, in registration order.
pub fn builtin() -> Vec<Box<dyn StoreMigration>> {
    vec![
        Box::new(AddHashValueIndex),
        Box::new(RegisterZstdMethod),
        Box::new(RetireZlibMethod),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationEngine;
    use dedupfs_store::{HashFunction, MemoryStore, StoreOptions};

    fn initialized() -> MemoryStore {
        let store = MemoryStore::new();
        store.initialize(HashFunction::Blake3).unwrap();
        store
    }

    #[test]
    fn test_builtin_pass_brings_store_current() {
        let engine = MigrationEngine::with_builtin();
        let store = initialized();
        let report = engine.process(&store).unwrap();

        assert!(report.reached_latest());
        assert_eq!(report.watermark, 3);
        assert!(store.find_compression_method("zstd").unwrap().is_some());
        assert!(!engine.is_migration_needed(&store).unwrap());
    }

    #[test]
    fn test_zstd_registration_is_idempotent() {
        let store = initialized();
        let m = RegisterZstdMethod;
        m.apply(&store).unwrap();
        let id = store.find_compression_method("zstd").unwrap().unwrap().id;
        m.apply(&store).unwrap();
        assert_eq!(
            store.find_compression_method("zstd").unwrap().unwrap().id,
            id
        );
    }

    #[test]
    fn test_zlib_retirement_preserves_id() {
        let store = initialized();
        let zlib_id = store.add_compression_method("zlib").unwrap();

        let m = RetireZlibMethod;
        m.apply(&store).unwrap();

        assert_eq!(
            store.compression_method_name(zlib_id).unwrap(),
            Some("zlib_v1".to_string())
        );
        // Re-run: no zlib row left, nothing to do.
        m.apply(&store).unwrap();
        assert_eq!(
            store.compression_method_name(zlib_id).unwrap(),
            Some("zlib_v1".to_string())
        );
    }

    #[test]
    fn test_retirement_skips_stores_that_never_had_zlib() {
        let store = initialized();
        let before = store.compression_methods().unwrap();
        RetireZlibMethod.apply(&store).unwrap();
        assert_eq!(store.compression_methods().unwrap(), before);
    }

    #[test]
    fn test_watermark_advances_per_migration() {
        let engine = MigrationEngine::with_builtin();
        let store = initialized();
        store.set_migration_watermark(2).unwrap();
        let report = engine.process(&store).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(store.migration_watermark().unwrap(), Some(3));
    }
}
