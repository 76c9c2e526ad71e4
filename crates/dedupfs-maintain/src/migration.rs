//! Schema/data migration engine.
//!
//! Migrations are numbered units of work registered with the engine at
//! build time and applied in strictly increasing numeric order, each at
//! most once. The applied watermark lives in the option table and only
//! ever advances. A failed migration halts the pass without touching the
//! watermark; operators fix the cause and re-run `process`, which is
//! always safe because migrations detect already-applied state themselves.

use dedupfs_store::{StoreBackend, StoreError, StoreOptions};
use tracing::{error, info};

use crate::error::MaintainError;

/// Diagnostic outcome of a failed migration. Carried as a value — never
/// as an unwinding panic.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct MigrationFailure {
    /// Human-readable diagnostic for the operator log.
    pub message: String,
}

impl MigrationFailure {
    /// Build a failure from any displayable diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<StoreError> for MigrationFailure {
    fn from(e: StoreError) -> Self {
        Self::new(e.to_string())
    }
}

/// One numbered schema/data migration.
///
/// `apply` must be internally transactional (use [`run_in_transaction`])
/// and idempotent: re-invocation against an already-migrated store either
/// no-ops or fails gracefully, since a lost watermark write re-runs it.
pub trait StoreMigration: Send + Sync {
    /// Identifier the ordering number is derived from, e.g.
    /// `"0002_register_zstd_method"`.
    fn name(&self) -> &'static str;

    /// Apply the migration against the store.
    fn apply(&self, store: &dyn StoreBackend) -> Result<(), MigrationFailure>;
}

/// Derive the sortable number from a migration identifier: every non-digit
/// character is stripped and the remaining digits parse as the number.
/// Identifiers without digits sort first as 0.
pub fn migration_number(name: &str) -> u32 {
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Run a closure inside a transaction, committing on success and rolling
/// back on failure. The watermark is not part of this scope.
pub fn run_in_transaction<T>(
    store: &dyn StoreBackend,
    f: impl FnOnce(&dyn StoreBackend) -> Result<T, MigrationFailure>,
) -> Result<T, MigrationFailure> {
    store.begin()?;
    match f(store) {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(failure) => {
            if let Err(e) = store.rollback() {
                error!(error = %e, "rollback failed after migration error");
            }
            Err(failure)
        }
    }
}

/// Result of one `process` pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    /// Watermark recorded after the pass.
    pub watermark: u32,
    /// Highest migration number known to the engine.
    pub latest: u32,
    /// Migrations applied during this pass.
    pub applied: u32,
}

impl ProcessReport {
    /// True when the store is at the version implied by the running code.
    pub fn reached_latest(&self) -> bool {
        self.watermark >= self.latest
    }
}

/// Ordered registry of migrations plus the logic to apply them.
#[derive(Default)]
pub struct MigrationEngine {
    migrations: Vec<Box<dyn StoreMigration>>,
}

impl MigrationEngine {
    /// An engine with no migrations registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine carrying the shipped schema history.
    pub fn with_builtin() -> Self {
        let mut engine = Self::new();
        for m in crate::migrations::builtin() {
            engine.register(m);
        }
        engine
    }

    /// Register a migration. Ordering is by derived number, stable for
    /// ties, regardless of registration order.
    pub fn register(&mut self, migration: Box<dyn StoreMigration>) {
        self.migrations.push(migration);
        self.migrations
            .sort_by_key(|m| migration_number(m.name()));
    }

    /// Highest migration number known to this engine, 0 when empty.
    pub fn latest_number(&self) -> u32 {
        self.migrations
            .iter()
            .map(|m| migration_number(m.name()))
            .max()
            .unwrap_or(0)
    }

    /// Whether `process` would do any work.
    ///
    /// A never-initialized store has nothing to migrate *from* and reports
    /// false. An initialized store with no recorded watermark predates
    /// migration tracking and reports true.
    pub fn is_migration_needed(&self, store: &dyn StoreBackend) -> Result<bool, MaintainError> {
        if !store.is_initialized() {
            return Ok(false);
        }
        match store.migration_watermark()? {
            None => Ok(true),
            Some(watermark) => Ok(self.latest_number() > watermark),
        }
    }

    /// Apply every migration numbered above the current watermark, in
    /// ascending order, advancing the watermark after each success. A
    /// failure stops the pass; earlier successes stay applied and
    /// recorded.
    pub fn process(&self, store: &dyn StoreBackend) -> Result<ProcessReport, MaintainError> {
        let mut watermark = store.migration_watermark()?.unwrap_or(0);
        let mut applied = 0u32;

        for migration in &self.migrations {
            let number = migration_number(migration.name());
            if number <= watermark {
                continue;
            }
            if !self.run_migration(migration.as_ref(), store) {
                break;
            }
            store.set_migration_watermark(number)?;
            watermark = number;
            applied += 1;
        }

        let report = ProcessReport {
            watermark,
            latest: self.latest_number(),
            applied,
        };
        if report.reached_latest() {
            info!(watermark, applied, "migration pass complete");
        } else {
            error!(
                watermark,
                latest = report.latest,
                "migration pass did not reach latest version"
            );
        }
        Ok(report)
    }

    /// Run one migration, logging the outcome. Failures are caught and
    /// reported, never re-raised.
    fn run_migration(&self, migration: &dyn StoreMigration, store: &dyn StoreBackend) -> bool {
        let name = migration.name();
        info!(migration = name, "applying migration");
        match migration.apply(store) {
            Ok(()) => {
                info!(migration = name, "migration applied");
                true
            }
            Err(failure) => {
                error!(migration = name, diagnostic = %failure, "migration failed");
                false
            }
        }
    }
}
