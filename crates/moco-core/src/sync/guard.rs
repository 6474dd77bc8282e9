//! Single-flight guard for sync operations
//!
//! At most one sync per user runs at a time. A second request for the same
//! user while one is active is refused instead of queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
    active: Arc<Mutex<HashSet<String>>>,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the sync slot for `user_id`
    ///
    /// Returns `None` if a sync for this user is already running. The slot is
    /// released when the permit is dropped.
    pub fn try_acquire(&self, user_id: &str) -> Option<SyncPermit> {
        let mut active = lock(&self.active);
        if !active.insert(user_id.to_string()) {
            return None;
        }
        Some(SyncPermit {
            active: Arc::clone(&self.active),
            user_id: user_id.to_string(),
        })
    }

    /// Whether a sync for `user_id` is running
    pub fn is_active(&self, user_id: &str) -> bool {
        lock(&self.active).contains(user_id)
    }
}

/// Held for the duration of one sync
#[derive(Debug)]
pub struct SyncPermit {
    active: Arc<Mutex<HashSet<String>>>,
    user_id: String,
}

impl SyncPermit {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.user_id);
    }
}

// The set stays consistent even if a holder panicked, so poisoning is ignored.
fn lock(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(|e| e.into_inner())
}
