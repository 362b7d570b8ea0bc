//! Invite lifecycle: pairing two identities into a session.
//!
//! [`Matchmaker`] owns invite creation and resolution. Accepting an invite
//! creates exactly one session through the [`SessionEngine`], with the
//! sender seated as X and the recipient as O.

use crate::{
    engine::SessionEngine,
    env::Environment,
    error::EngineError,
    event::{Event, Notice},
    invite::{Invite, InviteId},
    player::PlayerProfile,
    session::Session,
    store::Store,
};

/// Orchestrates the invite lifecycle against the store.
#[derive(Debug, Clone)]
pub struct Matchmaker<S, E> {
    store: S,
    env: E,
}

impl<S, E> Matchmaker<S, E>
where
    S: Store,
    E: Environment,
{
    /// Create a matchmaker over the given store and environment.
    pub fn new(store: S, env: E) -> Self {
        Self { store, env }
    }

    /// Create a pending invite from one identity to another.
    ///
    /// Returns the invite plus a `GameInvite` notice addressed to the
    /// recipient (delivered only if they are reachable; an offline recipient
    /// discovers the invite by querying their pending set).
    ///
    /// # Errors
    ///
    /// - [`EngineError::SelfInvite`] if sender and recipient are the same
    /// - [`EngineError::PlayerNotFound`] if either identity has no profile
    pub fn create_invite(
        &self,
        from: &str,
        to: &str,
    ) -> Result<(Invite, Vec<Notice>), EngineError> {
        if from == to {
            return Err(EngineError::SelfInvite);
        }

        let sender = self.load_profile(from)?;
        // The recipient must exist before anything is addressed to them.
        self.load_profile(to)?;

        let invite =
            Invite::new(self.env.random_u64(), from, to, self.env.wall_clock_millis());
        self.store.put_invite(&invite)?;

        tracing::debug!("invite {:016x} created: {} -> {}", invite.id, from, to);

        let notices =
            vec![Notice::new(to, Event::GameInvite { invite_id: invite.id, from: sender })];

        Ok((invite, notices))
    }

    /// Resolve a pending invite.
    ///
    /// Declining records the resolution and nothing more. Accepting records
    /// the resolution, creates the session, and returns notices for both
    /// parties: `InviteAccepted` to the sender, `SessionStarted` to the
    /// recipient.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InviteNotFound`] if no such invite exists
    /// - [`EngineError::AlreadyResolved`] if the invite is not pending
    pub fn resolve_invite(
        &self,
        invite_id: InviteId,
        accept: bool,
        sessions: &SessionEngine<S, E>,
    ) -> Result<(Invite, Option<Session>, Vec<Notice>), EngineError> {
        let mut invite = self
            .store
            .load_invite(invite_id)?
            .ok_or(EngineError::InviteNotFound(invite_id))?;

        invite.resolve(accept, self.env.wall_clock_millis())?;

        if !accept {
            self.store.put_invite(&invite)?;
            tracing::debug!("invite {:016x} declined by {}", invite.id, invite.to);
            return Ok((invite, None, Vec::new()));
        }

        // Profiles are needed for the notices either way; loading them before
        // the invite write keeps a missing profile from half-resolving it.
        let sender = self.load_profile(&invite.from)?;
        let recipient = self.load_profile(&invite.to)?;

        self.store.put_invite(&invite)?;
        let session = sessions.create_session(invite.from.clone(), invite.to.clone())?;

        let notices = vec![
            Notice::new(
                invite.from.clone(),
                Event::InviteAccepted { session_id: session.id, opponent: recipient },
            ),
            Notice::new(
                invite.to.clone(),
                Event::SessionStarted { session_id: session.id, opponent: sender },
            ),
        ];

        Ok((invite, Some(session), notices))
    }

    /// Pending invites addressed to an identity, each joined with the
    /// sender's profile.
    pub fn pending_invites_for(
        &self,
        player: &str,
    ) -> Result<Vec<(Invite, PlayerProfile)>, EngineError> {
        let mut pending = Vec::new();
        for invite in self.store.list_invites()? {
            if invite.to == player && invite.is_pending() {
                let sender = self.load_profile(&invite.from)?;
                pending.push((invite, sender));
            }
        }
        Ok(pending)
    }

    fn load_profile(&self, player: &str) -> Result<PlayerProfile, EngineError> {
        self.store
            .load_player(player)?
            .ok_or_else(|| EngineError::PlayerNotFound(player.to_owned()))
    }
}
