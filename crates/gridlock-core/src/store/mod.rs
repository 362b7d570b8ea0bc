//! Persistence abstraction for sessions, invites, and player profiles.
//!
//! Trait-based abstraction over an opaque keyed store. The trait is
//! synchronous (no async) to keep engine logic runtime-agnostic; absent
//! records are `Ok(None)`, not errors. Failures are surfaced to the caller,
//! never retried internally.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use crate::{
    invite::{Invite, InviteId},
    player::PlayerProfile,
    session::{Session, SessionId},
};

/// Storage abstraction for the three record families.
///
/// Must be `Clone` (handed to engine, matchmaker, and driver), `Send + Sync`
/// (thread-safe), and synchronous. Implementations typically share internal
/// state via `Arc`, so clones access the same underlying storage.
///
/// Mutation is whole-record put per key; the surrounding driver serializes
/// read-modify-write cycles (single logical writer), while implementations
/// stay individually thread-safe (mutex or transactions) so that assumption
/// is not a correctness requirement of the storage layer.
pub trait Store: Clone + Send + Sync + 'static {
    /// Load a session record. `Ok(None)` if absent.
    fn load_session(&self, id: SessionId) -> Result<Option<Session>, StoreError>;

    /// Write a session record, replacing any prior value under its id.
    fn put_session(&self, session: &Session) -> Result<(), StoreError>;

    /// All session records, in no particular order.
    fn list_sessions(&self) -> Result<Vec<Session>, StoreError>;

    /// Load an invite record. `Ok(None)` if absent.
    fn load_invite(&self, id: InviteId) -> Result<Option<Invite>, StoreError>;

    /// Write an invite record, replacing any prior value under its id.
    fn put_invite(&self, invite: &Invite) -> Result<(), StoreError>;

    /// All invite records, in no particular order.
    fn list_invites(&self) -> Result<Vec<Invite>, StoreError>;

    /// Load a player profile. `Ok(None)` if absent.
    fn load_player(&self, id: &str) -> Result<Option<PlayerProfile>, StoreError>;

    /// Write a player profile, replacing any prior value under its id.
    fn put_player(&self, profile: &PlayerProfile) -> Result<(), StoreError>;

    /// All player profiles, in no particular order.
    fn list_players(&self) -> Result<Vec<PlayerProfile>, StoreError>;
}
