//! Engine error types.
//!
//! One variant per rejection reason the request surface can produce. All are
//! recoverable at the caller: the driver maps each onto a rejection message
//! delivered to the originating connection only, never broadcast.

use crate::{invite::InviteId, player::PlayerId, session::SessionId, store::StoreError};

/// Errors from engine and matchmaker operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// No session record under this identifier.
    #[error("session not found: {0:016x}")]
    SessionNotFound(SessionId),

    /// No invite record under this identifier.
    #[error("invite not found: {0:016x}")]
    InviteNotFound(InviteId),

    /// No profile under this identity, or the identity holds no seat in the
    /// session it tried to act on.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Move attempted on a session that already reached an outcome.
    /// A finished board is never mutated again.
    #[error("session {0:016x} is already finished")]
    SessionOver(SessionId),

    /// Target slot already holds a mark.
    #[error("slot {0} is already occupied")]
    SlotOccupied(usize),

    /// The acting player's seat does not match the current-turn marker.
    #[error("it is not {0}'s turn")]
    WrongTurn(PlayerId),

    /// Invite was already accepted or declined; resolution is one-way.
    #[error("invite {0:016x} is already resolved")]
    AlreadyResolved(InviteId),

    /// Sender and recipient of an invite are the same identity.
    #[error("a player cannot invite themselves")]
    SelfInvite,

    /// A durable read or write did not complete. Surfaced, never swallowed:
    /// a failed write must not be reported as success. The caller retries
    /// the whole operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
