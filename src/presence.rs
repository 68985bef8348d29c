//! The set of currently connected participants.

use crate::protocol::Presence;

/// Snapshot-only view of who is in the chat.
///
/// The server is the source of truth: the registry is only ever replaced in
/// full from a snapshot, never patched from join/leave notices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceRegistry {
    entries: Vec<Presence>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole registry with `snapshot`, keeping delivery order.
    pub fn replace(&mut self, snapshot: Vec<Presence>) {
        self.entries = snapshot;
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of connected participants.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order the server delivered them.
    pub fn entries(&self) -> &[Presence] {
        &self.entries
    }
}
