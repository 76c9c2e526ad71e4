//! Read-only integrity scan: recompute every stored hash and compare to
//! the recorded value.
//!
//! Verify never mutates the store and never touches the active hash
//! function. Its two failure signals are kept strictly apart: a visited
//! count that differs from the up-front row count is an operational
//! anomaly with the scan itself, while recomputed hashes that differ from
//! the recorded values are data corruption.

use std::collections::HashMap;

use dedupfs_store::{decompress_method, HashFunction, StoreBackend, StoreOptions};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::MaintainError;
use crate::scan::ScanProgress;

/// Counters from one verify pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Row count captured before the cursor was opened.
    pub expected: u64,
    /// Rows the cursor actually visited.
    pub visited: u64,
    /// Visited rows whose recomputed hash matched the stored value.
    pub matched: u64,
}

/// Interpretation of a [`VerifyReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Every row was visited and every hash matched.
    Clean,
    /// The scan did not see exactly the rows counted up front — the store
    /// was mutated mid-scan or the cursor malfunctioned. Says nothing
    /// about data integrity.
    ScanAnomaly {
        /// Rows counted before the scan.
        expected: u64,
        /// Rows actually visited.
        visited: u64,
    },
    /// Recorded hashes disagree with the stored payloads.
    Corrupted {
        /// Number of mismatching rows.
        mismatched: u64,
    },
}

impl VerifyReport {
    /// Classify the counters. A count anomaly is reported before
    /// corruption: if the scan itself misbehaved, the mismatch count is
    /// not trustworthy either.
    pub fn outcome(&self) -> VerifyOutcome {
        if self.visited != self.expected {
            VerifyOutcome::ScanAnomaly {
                expected: self.expected,
                visited: self.visited,
            }
        } else if self.matched != self.visited {
            VerifyOutcome::Corrupted {
                mismatched: self.visited - self.matched,
            }
        } else {
            VerifyOutcome::Clean
        }
    }

    /// True when the pass found nothing wrong.
    pub fn is_clean(&self) -> bool {
        self.outcome() == VerifyOutcome::Clean
    }

    /// Process exit code: 0 clean, 1 corruption, 2 scan anomaly.
    pub fn exit_code(&self) -> i32 {
        match self.outcome() {
            VerifyOutcome::Clean => 0,
            VerifyOutcome::Corrupted { .. } => 1,
            VerifyOutcome::ScanAnomaly { .. } => 2,
        }
    }
}

/// A verify pass over one store.
pub struct Verify<'a> {
    store: &'a dyn StoreBackend,
    progress: ScanProgress,
}

impl<'a> Verify<'a> {
    /// Prepare a verify pass against the given store.
    pub fn new(store: &'a dyn StoreBackend) -> Self {
        Self {
            store,
            progress: ScanProgress::new(),
        }
    }

    /// A handle for observing progress from another thread.
    pub fn progress(&self) -> ScanProgress {
        self.progress.clone()
    }

    /// Recompute and compare every stored hash under the active function.
    pub fn run(&self) -> Result<VerifyReport, MaintainError> {
        let function: HashFunction = self
            .store
            .hash_function()?
            .ok_or(MaintainError::HashFunctionUnset)?
            .parse()
            .map_err(MaintainError::Store)?;

        let methods: HashMap<u32, String> = self
            .store
            .compression_methods()?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect();

        let expected = self.store.hash_count()?;
        self.progress.start(expected);
        info!(function = %function, rows = expected, "starting verify");

        let mut visited = 0u64;
        let mut matched = 0u64;

        for entry in self.store.hash_entries()? {
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
            visited += 1;
            self.progress.advance();

            if function.digest(&plain) == entry.hash {
                matched += 1;
            } else {
                warn!(block_id = entry.id, stored = %entry.hash_hex(), "hash mismatch");
            }
        }

        let report = VerifyReport {
            expected,
            visited,
            matched,
        };
        match report.outcome() {
            VerifyOutcome::Clean => {
                info!(visited, "verify clean");
            }
            VerifyOutcome::ScanAnomaly { expected, visited } => {
                warn!(expected, visited, "verify scan anomaly");
            }
            VerifyOutcome::Corrupted { mismatched } => {
                warn!(mismatched, "verify found corrupted rows");
            }
        }
        Ok(report)
    }
}
