//! Token Revocation Registry
//! Mission: Track revoked session tokens for the life of the process

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Process-wide set of revoked token strings.
///
/// Consulted by the validator before any signature work, so a revoked token
/// is rejected without decode cost. Insertion is idempotent and there is no
/// un-revoke operation. Each entry keeps the token's natural expiry so a
/// periodic sweep can drop entries the expiry check would reject anyway.
///
/// In-memory only: revocations do not survive a restart. A restarted process
/// starts with an empty registry, which is acceptable here because tokens are
/// short-lived.
pub struct RevocationRegistry {
    entries: Mutex<HashMap<String, i64>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record a token as revoked. Idempotent: revoking twice is the same as
    /// revoking once. `expires_at` is the token's own expiry timestamp, used
    /// only by [`purge_expired`](Self::purge_expired).
    pub fn revoke(&self, token: &str, expires_at: i64) {
        let mut entries = self.entries.lock();
        entries.entry(token.to_string()).or_insert(expires_at);
    }

    /// Whether a token has been revoked.
    pub fn is_revoked(&self, token: &str) -> bool {
        self.entries.lock().contains_key(token)
    }

    /// Drop entries whose natural expiry has passed. Safe: an expired token
    /// is rejected by the validator's expiry check regardless of the
    /// registry. Returns the number of entries removed.
    pub fn purge_expired(&self, now: i64) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, remaining = entries.len(), "Swept revocation registry");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for RevocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
