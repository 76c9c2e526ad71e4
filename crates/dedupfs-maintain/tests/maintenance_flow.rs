//! End-to-end maintenance lifecycle over the in-memory backend: open and
//! migrate a store, populate it, switch hash functions, and audit it.

use dedupfs_maintain::{
    rehash::exit_code, MaintainError, MigrationEngine, Rehash, RetentionPlanner, RetentionPolicy,
    Verify, VerifyOutcome,
};
use dedupfs_store::{
    compress, CompressionCodec, HashFunction, MemoryStore, StoreBackend, StoreOptions,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A legacy store: created before zstd existed, still carrying a zlib
/// method row and zlib-compressed blocks, with no migration watermark.
fn legacy_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.initialize(HashFunction::Sha256).unwrap();
    let zlib = store.add_compression_method("zlib").unwrap();
    let lz4 = store.find_compression_method("lz4").unwrap().unwrap().id;

    let contents: [(u64, &[u8], u32, CompressionCodec); 3] = [
        (1, b"the first block body", lz4, CompressionCodec::Lz4),
        (2, b"an old zlib-compressed block", zlib, CompressionCodec::Zlib { level: 6 }),
        (3, b"another lz4 block, longer than the others", lz4, CompressionCodec::Lz4),
    ];
    for (id, content, method, codec) in contents {
        let packed = compress(content, codec).unwrap();
        store.insert_block(id, &packed, method).unwrap();
        store
            .insert_hash(id, &HashFunction::Sha256.digest(content))
            .unwrap();
    }
    store
}

#[test]
fn test_full_lifecycle() {
    init_tracing();
    let store = legacy_store();
    let engine = MigrationEngine::with_builtin();

    // Store open: the legacy store predates watermark tracking.
    assert!(engine.is_migration_needed(&store).unwrap());
    let report = engine.process(&store).unwrap();
    assert!(report.reached_latest());
    assert_eq!(report.applied, 3);

    // Schema history applied: zstd registered, zlib retired to its alias.
    assert!(store.find_compression_method("zstd").unwrap().is_some());
    assert!(store.find_compression_method("zlib").unwrap().is_none());
    assert!(store.find_compression_method("zlib_v1").unwrap().is_some());

    // A second open is a no-op.
    assert!(!engine.is_migration_needed(&store).unwrap());

    // The legacy zlib block still verifies through the alias.
    let verify = Verify::new(&store).run().unwrap();
    assert_eq!(verify.outcome(), VerifyOutcome::Clean);
    assert_eq!(verify.visited, 3);

    // Operator switches the store to blake3.
    let result = Rehash::new(&store).run(HashFunction::Blake3);
    assert_eq!(exit_code(&result), 0);
    let rehashed = result.unwrap();
    assert_eq!(rehashed.visited, 3);
    assert_eq!(rehashed.updated, 3);
    assert_eq!(store.hash_function().unwrap(), Some("blake3".to_string()));

    // The audit passes under the new function.
    let verify = Verify::new(&store).run().unwrap();
    assert_eq!(verify.outcome(), VerifyOutcome::Clean);

    // Simulated bit rot is reported as corruption, not as an anomaly.
    store.update_hash(2, b"rotten").unwrap();
    let verify = Verify::new(&store).run().unwrap();
    assert_eq!(verify.outcome(), VerifyOutcome::Corrupted { mismatched: 1 });
    assert_eq!(verify.exit_code(), 1);
}

#[test]
fn test_rehash_failure_leaves_migrated_store_intact() {
    init_tracing();
    let store = legacy_store();
    MigrationEngine::with_builtin().process(&store).unwrap();

    // An orphaned hash row makes the pass unable to account for every
    // row; the whole rehash must roll back.
    store.insert_hash(9, b"orphan").unwrap();
    let before = store.snapshot_for_test();

    let result = Rehash::new(&store).run(HashFunction::Blake3);
    assert_eq!(exit_code(&result), 1);
    assert!(matches!(
        result.unwrap_err(),
        MaintainError::RowCountMismatch {
            expected: 4,
            visited: 3
        }
    ));
    assert_eq!(store.snapshot_for_test(), before);
    assert_eq!(store.hash_function().unwrap(), Some("sha256".to_string()));
}

#[test]
fn test_failed_migration_pass_is_resumable() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    init_tracing();

    struct Flaky {
        works: Arc<AtomicBool>,
    }
    impl dedupfs_maintain::StoreMigration for Flaky {
        fn name(&self) -> &'static str {
            "0004_flaky_backfill"
        }
        fn apply(
            &self,
            _store: &dyn StoreBackend,
        ) -> Result<(), dedupfs_maintain::MigrationFailure> {
            if self.works.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(dedupfs_maintain::MigrationFailure::new(
                    "backing table unavailable",
                ))
            }
        }
    }

    let works = Arc::new(AtomicBool::new(false));
    let mut engine = MigrationEngine::with_builtin();
    engine.register(Box::new(Flaky {
        works: works.clone(),
    }));

    let store = legacy_store();
    let report = engine.process(&store).unwrap();
    assert!(!report.reached_latest());
    assert_eq!(report.watermark, 3);

    // Operator fixes the cause and re-runs; only the failed migration
    // remains.
    works.store(true, Ordering::SeqCst);
    let report = engine.process(&store).unwrap();
    assert!(report.reached_latest());
    assert_eq!(report.applied, 1);
    assert_eq!(store.migration_watermark().unwrap(), Some(4));
}

#[test]
fn test_retention_plan_for_snapshot_lifecycle() {
    use chrono::{Datelike, Duration, TimeZone, Utc};

    // Two years of nightly snapshots feeding the lifecycle process.
    let last = Utc.with_ymd_and_hms(2026, 8, 1, 2, 30, 0).unwrap();
    let dates: Vec<_> = (0..730).map(|i| last - Duration::days(i)).collect();

    let planner = RetentionPlanner::new(RetentionPolicy {
        max_daily: 7,
        max_weekly: 4,
        max_monthly: 2,
        max_yearly: 1,
    });
    let plan = planner.classify(&dates);

    assert_eq!(plan.kept().len() + plan.removed().len(), dates.len());
    assert!(plan.kept().len() <= 20, "kept {}", plan.kept().len());
    // The whole daily window survives.
    for d in &dates[..7] {
        assert!(plan.kept().contains(d));
    }
    // Everything older than the yearly horizon is gone.
    for d in plan.kept() {
        assert!(last.year() - d.year() <= 1, "kept too-old snapshot {d}");
    }
}
