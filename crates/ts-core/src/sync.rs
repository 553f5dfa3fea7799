//! Echo suppression for shared-store sync.
//!
//! When a local write comes back from the store as a "remote" update it must
//! not be treated as someone else's edit. [`EchoGuard`] remembers the
//! fingerprint of the last snapshot sent and swallows the matching inbound
//! update once.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::model::LedgerSnapshot;

/// Stable content fingerprint of a snapshot.
///
/// Computed over the canonical JSON encoding, so two snapshots that
/// serialize identically share a fingerprint.
pub fn fingerprint(snapshot: &LedgerSnapshot) -> Result<u64, serde_json::Error> {
    let encoded = serde_json::to_string(snapshot)?;
    let mut hasher = DefaultHasher::new();
    encoded.hash(&mut hasher);
    Ok(hasher.finish())
}

/// Suppresses the echo of the most recent local write.
#[derive(Debug, Default, Clone)]
pub struct EchoGuard {
    pending: Option<u64>,
}

impl EchoGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers a snapshot that was just written locally.
    pub fn note_local_write(&mut self, snapshot: &LedgerSnapshot) -> Result<(), serde_json::Error> {
        self.pending = Some(fingerprint(snapshot)?);
        Ok(())
    }

    /// Whether an inbound snapshot should be applied.
    ///
    /// Returns `false` once for the echo of the last local write; any other
    /// snapshot is accepted and clears the pending write.
    pub fn accept_remote(&mut self, snapshot: &LedgerSnapshot) -> bool {
        let Some(pending) = self.pending.take() else {
            return true;
        };
        match fingerprint(snapshot) {
            Ok(incoming) => incoming != pending,
            Err(err) => {
                tracing::warn!(error = %err, "could not fingerprint inbound snapshot");
                true
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_is_suppressed_once() {
        let snapshot = LedgerSnapshot::sample();
        let mut guard = EchoGuard::new();
        guard.note_local_write(&snapshot).unwrap();

        assert!(!guard.accept_remote(&snapshot));
        assert!(guard.accept_remote(&snapshot));
    }

    #[test]
    fn different_snapshot_is_accepted() {
        let local = LedgerSnapshot::sample();
        let mut remote = local.clone();
        remote.reset();

        let mut guard = EchoGuard::new();
        guard.note_local_write(&local).unwrap();
        assert!(guard.accept_remote(&remote));
        assert!(!guard.has_pending());
    }

    #[test]
    fn nothing_pending_accepts_everything() {
        let mut guard = EchoGuard::new();
        assert!(guard.accept_remote(&LedgerSnapshot::sample()));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = LedgerSnapshot::sample();
        let mut b = a.clone();
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
        b.name.push('!');
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }
}
