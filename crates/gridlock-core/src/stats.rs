//! Service-wide statistics snapshot.
//!
//! Computed on demand from the store and the presence ledger; no counters
//! are maintained separately, so the snapshot cannot drift from the records.

use serde::{Deserialize, Serialize};

use crate::{
    presence::PresenceLedger,
    store::{Store, StoreError},
};

/// Point-in-time service statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Profiles ever created.
    pub total_players: usize,
    /// Identities currently reachable.
    pub online_players: usize,
    /// Sessions still in play.
    pub active_sessions: usize,
    /// Sessions that reached an outcome.
    pub finished_sessions: usize,
    /// All sessions ever created.
    pub total_sessions: usize,
}

/// Gather a snapshot from the store and ledger.
pub fn snapshot<S: Store>(
    store: &S,
    ledger: &PresenceLedger,
) -> Result<StatsSnapshot, StoreError> {
    let sessions = store.list_sessions()?;
    let finished = sessions.iter().filter(|session| session.is_finished()).count();

    Ok(StatsSnapshot {
        total_players: store.list_players()?.len(),
        online_players: ledger.online_count(),
        active_sessions: sessions.len() - finished,
        finished_sessions: finished,
        total_sessions: sessions.len(),
    })
}
