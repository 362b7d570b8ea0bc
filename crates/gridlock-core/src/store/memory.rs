#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{Store, StoreError};
use crate::{
    invite::{Invite, InviteId},
    player::PlayerProfile,
    session::{Session, SessionId},
};

/// In-memory store implementation.
///
/// Reference backend: used by tests, and by the server when started without
/// a storage path. `HashMap`s per record family wrapped in `Arc<Mutex<_>>`
/// so clones share state. Uses `lock().expect()`, which panics if the mutex
/// is poisoned (a thread panicked while holding the lock); acceptable here
/// because every critical section is a plain map operation.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    sessions: HashMap<SessionId, Session>,
    invites: HashMap<InviteId, Invite>,
    players: HashMap<String, PlayerProfile>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(MemoryStoreInner::default())) }
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().expect("mutex poisoned")
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn load_session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.lock().sessions.get(&id).cloned())
    }

    fn put_session(&self, session: &Session) -> Result<(), StoreError> {
        self.lock().sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.lock().sessions.values().cloned().collect())
    }

    fn load_invite(&self, id: InviteId) -> Result<Option<Invite>, StoreError> {
        Ok(self.lock().invites.get(&id).cloned())
    }

    fn put_invite(&self, invite: &Invite) -> Result<(), StoreError> {
        self.lock().invites.insert(invite.id, invite.clone());
        Ok(())
    }

    fn list_invites(&self) -> Result<Vec<Invite>, StoreError> {
        Ok(self.lock().invites.values().cloned().collect())
    }

    fn load_player(&self, id: &str) -> Result<Option<PlayerProfile>, StoreError> {
        Ok(self.lock().players.get(id).cloned())
    }

    fn put_player(&self, profile: &PlayerProfile) -> Result<(), StoreError> {
        self.lock().players.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    fn list_players(&self) -> Result<Vec<PlayerProfile>, StoreError> {
        Ok(self.lock().players.values().cloned().collect())
    }
}
