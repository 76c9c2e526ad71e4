//! Well-known option-table keys and typed accessors.

use crate::backend::StoreBackend;
use crate::error::StoreError;

/// Option key holding the name of the currently active hash function.
pub const OPT_HASH_FUNCTION: &str = "hash_function";

/// Option key holding the highest applied migration number.
pub const OPT_MIGRATION: &str = "migration";

/// Typed access to the well-known options, available on every backend.
pub trait StoreOptions: StoreBackend {
    /// Name of the currently active hash function, if the store was
    /// initialized.
    fn hash_function(&self) -> Result<Option<String>, StoreError> {
        self.option(OPT_HASH_FUNCTION)
    }

    /// Persist the active hash function name.
    fn set_hash_function(&self, name: &str) -> Result<(), StoreError> {
        self.set_option(OPT_HASH_FUNCTION, name)
    }

    /// The applied-migration watermark. None if no migration was ever
    /// recorded; a value that does not parse as a number is treated the
    /// same way so a corrupted option re-runs the (idempotent) migrations
    /// rather than silently skipping them.
    fn migration_watermark(&self) -> Result<Option<u32>, StoreError> {
        Ok(self
            .option(OPT_MIGRATION)?
            .and_then(|v| v.trim().parse::<u32>().ok()))
    }

    /// Advance the applied-migration watermark.
    fn set_migration_watermark(&self, number: u32) -> Result<(), StoreError> {
        self.set_option(OPT_MIGRATION, &number.to_string())
    }
}

impl<T: StoreBackend + ?Sized> StoreOptions for T {}
