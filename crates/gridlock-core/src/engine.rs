//! Session orchestration against the store.
//!
//! [`SessionEngine`] owns the full move pipeline:
//!
//! 1. Load the session record (no lazy creation)
//! 2. Apply the move through the session state machine
//! 3. On a finishing move, fold the result into both players' statistics
//! 4. Write the updated records durably
//! 5. Return the notices for the transport layer to deliver
//!
//! Store failures abort the pipeline and surface to the caller; a failed
//! write is never reported as success. A session left partially settled by a
//! mid-pipeline store failure is the caller's to retry.

use crate::{
    board::{Mark, Slot},
    env::Environment,
    error::EngineError,
    event::{Event, Notice},
    player::{GameResult, PlayerId, PlayerProfile},
    session::{Outcome, Session, SessionId},
    store::Store,
};

/// Orchestrates session creation, moves, and statistics settlement.
///
/// Holds clones of the store and environment; all match state lives in the
/// store, so the engine itself carries nothing between calls.
#[derive(Debug, Clone)]
pub struct SessionEngine<S, E> {
    store: S,
    env: E,
}

impl<S, E> SessionEngine<S, E>
where
    S: Store,
    E: Environment,
{
    /// Create an engine over the given store and environment.
    pub fn new(store: S, env: E) -> Self {
        Self { store, env }
    }

    /// Start a new session with `player_x` opening.
    ///
    /// Callers (the matchmaker) validate that both identities exist; the
    /// engine only mints the record.
    pub fn create_session(
        &self,
        player_x: impl Into<PlayerId>,
        player_o: impl Into<PlayerId>,
    ) -> Result<Session, EngineError> {
        let session = Session::new(
            self.env.random_u64(),
            player_x,
            player_o,
            self.env.wall_clock_millis(),
        );
        self.store.put_session(&session)?;

        tracing::info!(
            "session {:016x} created: {} (X) vs {} (O)",
            session.id,
            session.player_x,
            session.player_o
        );

        Ok(session)
    }

    /// Fetch a session by identifier.
    pub fn session(&self, id: SessionId) -> Result<Session, EngineError> {
        self.store.load_session(id)?.ok_or(EngineError::SessionNotFound(id))
    }

    /// Apply one move and return the updated session plus the notices to
    /// deliver: `MoveMade` to both participants, and on the finishing
    /// transition a second `SessionFinished`.
    pub fn apply_move(
        &self,
        session_id: SessionId,
        actor: &str,
        slot: Slot,
    ) -> Result<(Session, Vec<Notice>), EngineError> {
        let mut session = self
            .store
            .load_session(session_id)?
            .ok_or(EngineError::SessionNotFound(session_id))?;

        let outcome = session.apply_move(actor, slot, self.env.wall_clock_millis())?;

        // Profiles are loaded and settled in memory before any write, so a
        // missing profile aborts with nothing persisted.
        let settled = match outcome {
            Some(outcome) => self.settle_statistics(&session, outcome)?,
            None => Vec::new(),
        };

        self.store.put_session(&session)?;
        for profile in &settled {
            self.store.put_player(profile)?;
        }

        let mut notices: Vec<Notice> = session
            .participants()
            .into_iter()
            .map(|player| {
                Notice::new(
                    player.clone(),
                    Event::MoveMade {
                        session: session.clone(),
                        slot,
                        actor: actor.to_owned(),
                    },
                )
            })
            .collect();

        if let Some(outcome) = outcome {
            for player in session.participants() {
                notices.push(Notice::new(
                    player.clone(),
                    Event::SessionFinished { session_id: session.id, outcome },
                ));
            }
            tracing::info!("session {:016x} finished: {:?}", session.id, outcome);
        } else {
            tracing::debug!("move applied in session {:016x}: {} at {}", session.id, actor, slot);
        }

        Ok((session, notices))
    }

    /// Fold a terminal outcome into the participants' statistics.
    ///
    /// Returns the updated profiles without writing them. When one identity
    /// holds both seats, both results fold into the single profile.
    fn settle_statistics(
        &self,
        session: &Session,
        outcome: Outcome,
    ) -> Result<Vec<PlayerProfile>, EngineError> {
        let (result_x, result_o) = match outcome {
            Outcome::Won { mark: Mark::X, .. } => (GameResult::Win, GameResult::Loss),
            Outcome::Won { mark: Mark::O, .. } => (GameResult::Loss, GameResult::Win),
            Outcome::Draw => (GameResult::Draw, GameResult::Draw),
        };

        let mut profile_x = self.load_profile(&session.player_x)?;
        profile_x.stats.record(result_x);

        if session.player_x == session.player_o {
            profile_x.stats.record(result_o);
            return Ok(vec![profile_x]);
        }

        let mut profile_o = self.load_profile(&session.player_o)?;
        profile_o.stats.record(result_o);

        Ok(vec![profile_x, profile_o])
    }

    fn load_profile(&self, player: &str) -> Result<PlayerProfile, EngineError> {
        self.store
            .load_player(player)?
            .ok_or_else(|| EngineError::PlayerNotFound(player.to_owned()))
    }
}
