// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-slot credential cache shared between the refresh scheduler and the
//! metadata routes.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

use crate::credential::CredentialSet;

/// Current credential set plus the time of its last successful refresh.
struct CacheRecord {
    current: Arc<CredentialSet>,
    /// `None` until a successful set has been installed.
    updated_at: Option<Instant>,
}

/// Holds exactly one credential set.
///
/// Values are immutable once installed; a commit swaps the whole `Arc` under
/// the write lock, so a reader always gets one complete set. The lock is
/// never held across an await.
pub struct CredentialStore {
    record: RwLock<CacheRecord>,
}

impl CredentialStore {
    /// Create an empty store holding [`CredentialSet::empty`].
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            record: RwLock::new(CacheRecord {
                current: Arc::new(CredentialSet::empty()),
                updated_at: None,
            }),
        })
    }

    /// Snapshot of the cached set.
    pub fn read(&self) -> Arc<CredentialSet> {
        Arc::clone(&self.record.read().current)
    }

    /// When the cached set was last replaced by a successful refresh.
    pub fn updated_at(&self) -> Option<Instant> {
        self.record.read().updated_at
    }

    /// Whether the cached set is at least `threshold` old at `now`.
    ///
    /// A store that never held a successful set is always stale.
    pub fn is_stale(&self, now: Instant, threshold: Duration) -> bool {
        match self.updated_at() {
            Some(at) => now.saturating_duration_since(at) >= threshold,
            None => true,
        }
    }

    /// Install `candidate` stamped at `now`, but only if it is a success.
    ///
    /// Returns whether the commit happened. A failed candidate leaves both the
    /// value and its timestamp untouched.
    pub fn try_commit(&self, candidate: CredentialSet, now: Instant) -> bool {
        if !candidate.is_success() {
            return false;
        }
        let candidate = Arc::new(candidate);
        let mut record = self.record.write();
        record.current = candidate;
        record.updated_at = Some(now);
        true
    }

    /// Install the startup result whatever its status.
    ///
    /// This is the only path that can expose a failure document to readers.
    /// The refresh timestamp only advances for a success, so a failed
    /// bootstrap is retried on the next tick.
    pub fn bootstrap(&self, candidate: CredentialSet, now: Instant) {
        let success = candidate.is_success();
        let candidate = Arc::new(candidate);
        let mut record = self.record.write();
        record.current = candidate;
        if success {
            record.updated_at = Some(now);
        }
    }

    /// Read-only handle for the metadata routes.
    pub fn reader(self: &Arc<Self>) -> CredentialReader {
        CredentialReader { store: Arc::clone(self) }
    }
}

/// Read-only view of a [`CredentialStore`].
#[derive(Clone)]
pub struct CredentialReader {
    store: Arc<CredentialStore>,
}

impl CredentialReader {
    pub fn read(&self) -> Arc<CredentialSet> {
        self.store.read()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
