//! Redb-backed durable store implementation.
//!
//! Uses redb's ACID transactions with copy-on-write for crash safety. All
//! records survive server restarts.

use std::{path::Path, sync::Arc};

use gridlock_core::{Invite, InviteId, PlayerProfile, Session, SessionId};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};

use super::{Store, StoreError};

/// Table: sessions
/// Key: session id as big-endian bytes [8 bytes]
/// Value: CBOR-encoded `Session`
const SESSIONS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("sessions");

/// Table: invites
/// Key: invite id as big-endian bytes [8 bytes]
/// Value: CBOR-encoded `Invite`
const INVITES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("invites");

/// Table: players
/// Key: identity key (UTF-8)
/// Value: CBOR-encoded `PlayerProfile`
const PLAYERS: TableDefinition<&str, &[u8]> = TableDefinition::new("players");

/// Durable store backed by redb.
///
/// Thread-safe through redb's internal locking. Clone is cheap (`Arc`).
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    ///
    /// Creates the tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(|e| StoreError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(SESSIONS).map_err(|e| StoreError::Io(e.to_string()))?;
            let _ = txn.open_table(INVITES).map_err(|e| StoreError::Io(e.to_string()))?;
            let _ = txn.open_table(PLAYERS).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn put_keyed(
        &self,
        table: TableDefinition<'_, &'static [u8], &'static [u8]>,
        key: u64,
        value: &impl Serialize,
    ) -> Result<(), StoreError> {
        let bytes = encode_record(value)?;

        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(table).map_err(|e| StoreError::Io(e.to_string()))?;
            table
                .insert(key.to_be_bytes().as_slice(), bytes.as_slice())
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    fn load_keyed<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'_, &'static [u8], &'static [u8]>,
        key: u64,
    ) -> Result<Option<T>, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(table).map_err(|e| StoreError::Io(e.to_string()))?;

        match table
            .get(key.to_be_bytes().as_slice())
            .map_err(|e| StoreError::Io(e.to_string()))?
        {
            Some(value) => Ok(Some(decode_record(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_keyed<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'_, &'static [u8], &'static [u8]>,
    ) -> Result<Vec<T>, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(table).map_err(|e| StoreError::Io(e.to_string()))?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(|e| StoreError::Io(e.to_string()))? {
            let (_, value) = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            records.push(decode_record(value.value())?);
        }
        Ok(records)
    }
}

fn encode_record(value: &impl Serialize) -> Result<Vec<u8>, StoreError> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    ciborium::de::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl Store for RedbStore {
    fn load_session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        self.load_keyed(SESSIONS, id)
    }

    fn put_session(&self, session: &Session) -> Result<(), StoreError> {
        self.put_keyed(SESSIONS, session.id, session)
    }

    fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        self.list_keyed(SESSIONS)
    }

    fn load_invite(&self, id: InviteId) -> Result<Option<Invite>, StoreError> {
        self.load_keyed(INVITES, id)
    }

    fn put_invite(&self, invite: &Invite) -> Result<(), StoreError> {
        self.put_keyed(INVITES, invite.id, invite)
    }

    fn list_invites(&self) -> Result<Vec<Invite>, StoreError> {
        self.list_keyed(INVITES)
    }

    fn load_player(&self, id: &str) -> Result<Option<PlayerProfile>, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(PLAYERS).map_err(|e| StoreError::Io(e.to_string()))?;

        match table.get(id).map_err(|e| StoreError::Io(e.to_string()))? {
            Some(value) => Ok(Some(decode_record(value.value())?)),
            None => Ok(None),
        }
    }

    fn put_player(&self, profile: &PlayerProfile) -> Result<(), StoreError> {
        let bytes = encode_record(profile)?;

        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(PLAYERS).map_err(|e| StoreError::Io(e.to_string()))?;
            table
                .insert(profile.id.as_str(), bytes.as_slice())
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    fn list_players(&self) -> Result<Vec<PlayerProfile>, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(PLAYERS).map_err(|e| StoreError::Io(e.to_string()))?;

        let mut profiles = Vec::new();
        for entry in table.iter().map_err(|e| StoreError::Io(e.to_string()))? {
            let (_, value) = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            profiles.push(decode_record(value.value())?);
        }
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use gridlock_core::{Mark, Slot};

    use super::*;

    fn open_temp() -> (tempfile::TempDir, RedbStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("gridlock.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn fresh_store_is_empty() {
        let (_dir, store) = open_temp();
        assert!(store.list_sessions().unwrap().is_empty());
        assert!(store.list_invites().unwrap().is_empty());
        assert!(store.list_players().unwrap().is_empty());
    }

    #[test]
    fn session_round_trip_preserves_moves() {
        let (_dir, store) = open_temp();

        let mut session = Session::new(42, "alice", "bob", 1_000);
        session.apply_move("alice", Slot::new(4).unwrap(), 1_001).unwrap();

        store.put_session(&session).unwrap();
        let loaded = store.load_session(42).unwrap().unwrap();

        assert_eq!(loaded, session);
        assert_eq!(loaded.moves[0].mark, Mark::X);
        assert_eq!(loaded.turn, Mark::O);
    }

    #[test]
    fn absent_records_load_as_none() {
        let (_dir, store) = open_temp();
        assert_eq!(store.load_session(1).unwrap(), None);
        assert_eq!(store.load_invite(1).unwrap(), None);
        assert_eq!(store.load_player("ghost").unwrap(), None);
    }

    #[test]
    fn put_replaces_prior_record() {
        let (_dir, store) = open_temp();

        let mut profile = PlayerProfile::new("alice", "Alice", 1_000);
        store.put_player(&profile).unwrap();

        profile.stats.record(gridlock_core::GameResult::Win);
        store.put_player(&profile).unwrap();

        let loaded = store.load_player("alice").unwrap().unwrap();
        assert_eq!(loaded.stats.games_won, 1);
        assert_eq!(store.list_players().unwrap().len(), 1);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridlock.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            store.put_session(&Session::new(7, "alice", "bob", 1_000)).unwrap();
            store.put_invite(&Invite::new(9, "alice", "bob", 1_000)).unwrap();
            store.put_player(&PlayerProfile::new("alice", "Alice", 1_000)).unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert!(store.load_session(7).unwrap().is_some());
        assert!(store.load_invite(9).unwrap().is_some());
        assert!(store.load_player("alice").unwrap().is_some());
    }

    #[test]
    fn list_returns_every_record() {
        let (_dir, store) = open_temp();

        for id in 0..5u64 {
            store.put_session(&Session::new(id, "alice", "bob", 0)).unwrap();
        }

        let mut ids: Vec<u64> =
            store.list_sessions().unwrap().into_iter().map(|s| s.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }
}
