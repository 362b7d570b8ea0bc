//! Presence ledger: which identities are reachable, and at which address.
//!
//! The ledger maintains bidirectional mappings between identities and
//! transport addresses (connection ids):
//! - `identity → address`: for routing notices
//! - `address → identity`: for resolving disconnects
//!
//! Entries are ephemeral and process-lifetime-scoped; nothing here touches
//! the store. An identity holds at most one live address: a reconnect
//! displaces the prior address (last-writer-wins) and reports it so the
//! caller can close the stale connection.

use std::collections::HashMap;

use crate::player::PlayerId;

/// A single presence entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceEntry {
    /// Transport address (connection id) the identity is reachable at.
    pub address: u64,
    /// Unix milliseconds when the entry was last written.
    pub last_seen_ms: u64,
}

/// Ledger of currently reachable identities.
#[derive(Debug, Default)]
pub struct PresenceLedger {
    /// Identity → presence entry.
    entries: HashMap<PlayerId, PresenceEntry>,
    /// Address → identity, for disconnect resolution.
    by_address: HashMap<u64, PlayerId>,
}

impl PresenceLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an identity reachable at `address`.
    ///
    /// Upserts: any prior address held by this identity is displaced and
    /// returned so the caller can close it. If the address was previously
    /// bound to a different identity (the connection re-identified), that
    /// binding is dropped too.
    pub fn mark_online(
        &mut self,
        player: impl Into<PlayerId>,
        address: u64,
        now_ms: u64,
    ) -> Option<u64> {
        let player = player.into();

        if let Some(prior) = self.by_address.insert(address, player.clone()) {
            if prior != player {
                self.entries.remove(&prior);
            }
        }

        let displaced = self
            .entries
            .insert(player, PresenceEntry { address, last_seen_ms: now_ms })
            .map(|entry| entry.address)
            .filter(|prior| *prior != address);

        if let Some(prior) = displaced {
            self.by_address.remove(&prior);
        }

        displaced
    }

    /// Remove an identity's entry, returning it if one existed.
    pub fn mark_offline(&mut self, player: &str) -> Option<PresenceEntry> {
        let entry = self.entries.remove(player)?;
        self.by_address.remove(&entry.address);
        Some(entry)
    }

    /// The identity bound to an address, if any.
    pub fn identity_for(&self, address: u64) -> Option<&PlayerId> {
        self.by_address.get(&address)
    }

    /// The address an identity is reachable at, if online.
    pub fn address_of(&self, player: &str) -> Option<u64> {
        self.entries.get(player).map(|entry| entry.address)
    }

    /// Whether an identity is currently reachable.
    pub fn is_online(&self, player: &str) -> bool {
        self.entries.contains_key(player)
    }

    /// Identities currently online, in no particular order.
    pub fn online_players(&self) -> impl Iterator<Item = &PlayerId> {
        self.entries.keys()
    }

    /// Number of identities currently online.
    pub fn online_count(&self) -> usize {
        self.entries.len()
    }
}
