//! Bulk rehash: replace the content hash of every stored block under a new
//! hash function, all-or-nothing.
//!
//! The whole pass runs inside one transaction over the hash table. Every
//! failure path — a row that cannot be processed, a codec or store error,
//! cancellation — rolls the transaction back and leaves the store exactly
//! as it was, including the `hash_function` option. Only a pass that
//! visited precisely the rows counted up front commits.
//!
//! The caller must quiesce all other writers first: the pass assumes
//! exclusive access to the hash, block and compression-type tables.

use std::collections::HashMap;

use dedupfs_store::{decompress_method, HashFunction, StoreBackend, StoreOptions};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::MaintainError;
use crate::scan::{CancelFlag, ScanProgress};

/// Outcome of a successful rehash pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RehashReport {
    /// Rows visited by the cursor pass.
    pub visited: u64,
    /// Rows whose hash value actually changed.
    pub updated: u64,
    /// True when the target already was the active function and nothing
    /// was touched.
    pub already_active: bool,
}

/// Map a rehash outcome to a process exit code: 0 for success (including
/// the already-active no-op), 1 for any rolled-back failure.
pub fn exit_code(result: &Result<RehashReport, MaintainError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// A rehash pass over one store.
pub struct Rehash<'a> {
    store: &'a dyn StoreBackend,
    progress: ScanProgress,
    cancel: CancelFlag,
}

impl<'a> Rehash<'a> {
    /// Prepare a rehash pass against the given store.
    pub fn new(store: &'a dyn StoreBackend) -> Self {
        Self {
            store,
            progress: ScanProgress::new(),
            cancel: CancelFlag::new(),
        }
    }

    /// A handle for observing progress from another thread.
    pub fn progress(&self) -> ScanProgress {
        self.progress.clone()
    }

    /// A handle for cancelling the pass from another thread. Cancellation
    /// rolls back like any other failure.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Rehash every stored block under `target`.
    pub fn run(&self, target: HashFunction) -> Result<RehashReport, MaintainError> {
        let target_name = target.to_string();
        if self.store.hash_function()?.as_deref() == Some(target_name.as_str()) {
            info!(target = %target_name, "hash function already active, nothing to do");
            return Ok(RehashReport {
                visited: 0,
                updated: 0,
                already_active: true,
            });
        }

        let methods: HashMap<u32, String> = self
            .store
            .compression_methods()?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect();

        let expected = self.store.hash_count()?;
        self.progress.start(expected);
        info!(target = %target_name, rows = expected, "starting rehash");

        self.store.begin()?;
        match self.scan(target, expected, &methods) {
            Ok(report) => {
                self.store.commit()?;
                self.store.set_hash_function(&target_name)?;
                self.store.vacuum("hash")?;
                info!(
                    target = %target_name,
                    visited = report.visited,
                    updated = report.updated,
                    "rehash complete"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(rb) = self.store.rollback() {
                    error!(error = %rb, "rollback failed after rehash error");
                }
                error!(target = %target_name, error = %e, "rehash rolled back");
                Err(e)
            }
        }
    }

    fn scan(
        &self,
        target: HashFunction,
        expected: u64,
        methods: &HashMap<u32, String>,
    ) -> Result<RehashReport, MaintainError> {
        let mut visited = 0u64;
        let mut updated = 0u64;

        for entry in self.store.hash_entries()? {
            if self.cancel.is_cancelled() {
                return Err(MaintainError::Cancelled { visited });
            }
            let entry = entry?;

            let Some(payload) = self.store.block(entry.id)? else {
                warn!(block_id = entry.id, "hash row has no block payload, skipping");
                continue;
            };
            let Some(method_id) = self.store.block_compression(entry.id)? else {
                warn!(block_id = entry.id, "block has no compression type, skipping");
                continue;
            };
            let method = methods
                .get(&method_id)
                .ok_or(MaintainError::UnknownCompressionMethod {
                    block_id: entry.id,
                    method_id,
                })?;

            let plain = decompress_method(method, &payload)?;
            let digest = target.digest(&plain);
            visited += 1;
            self.progress.advance();

            if digest != entry.hash {
                self.store.update_hash(entry.id, &digest)?;
                updated += 1;
            }
        }

        if visited != expected {
            return Err(MaintainError::RowCountMismatch { expected, visited });
        }
        Ok(RehashReport {
            visited,
            updated,
            already_active: false,
        })
    }
}
