//! DedupFS maintenance subsystem: schema migrations, bulk rehash/verify
//! integrity scans over the block index, and generation-based snapshot
//! retention.
//!
//! All operations are synchronous, single-threaded passes over a
//! [`dedupfs_store::StoreBackend`]. The migration engine runs at store
//! open, before any other traffic; rehash requires exclusive access for
//! its transaction; verify may run alongside read-only traffic; the
//! retention planner touches no shared state at all.

pub mod error;
pub mod migration;
pub mod migrations;
pub mod rehash;
pub mod retention;
pub mod scan;
pub mod verify;

pub use error::MaintainError;
pub use migration::{
    migration_number, run_in_transaction, MigrationEngine, MigrationFailure, ProcessReport,
    StoreMigration,
};
pub use rehash::{Rehash, RehashReport};
pub use retention::{RetentionPlan, RetentionPlanner, RetentionPolicy};
pub use scan::{CancelFlag, ScanProgress};
pub use verify::{Verify, VerifyOutcome, VerifyReport};
