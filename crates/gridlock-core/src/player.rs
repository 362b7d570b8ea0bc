//! Player profiles and cumulative statistics.
//!
//! Profiles are created on first contact, mutated after every finished
//! session, and never deleted. The statistics counters satisfy
//! `games_played == games_won + games_lost + games_drawn` after every
//! [`PlayerStats::record`] call.

use serde::{Deserialize, Serialize};

/// Opaque string key identifying a player.
pub type PlayerId = String;

/// Terminal result of one session from a single player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    /// Player completed a winning line.
    Win,
    /// Opponent completed a winning line.
    Loss,
    /// Board filled with no winning line.
    Draw,
}

/// Cumulative per-player statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Finished sessions this player took part in.
    pub games_played: u32,
    /// Sessions won.
    pub games_won: u32,
    /// Sessions lost.
    pub games_lost: u32,
    /// Sessions drawn.
    pub games_drawn: u32,
    /// Consecutive wins, reset by any loss or draw.
    pub win_streak: u32,
    /// Highest `win_streak` ever reached.
    pub best_win_streak: u32,
}

impl PlayerStats {
    /// Fold one finished session into the counters.
    pub fn record(&mut self, result: GameResult) {
        self.games_played += 1;

        match result {
            GameResult::Win => {
                self.games_won += 1;
                self.win_streak += 1;
                if self.win_streak > self.best_win_streak {
                    self.best_win_streak = self.win_streak;
                }
            },
            GameResult::Loss => {
                self.games_lost += 1;
                self.win_streak = 0;
            },
            GameResult::Draw => {
                self.games_drawn += 1;
                self.win_streak = 0;
            },
        }
    }
}

/// A player's durable record: identity, display attributes, statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Opaque identity key.
    pub id: PlayerId,
    /// Name shown to other players in invites and rosters.
    pub display_name: String,
    /// Unix milliseconds at first contact.
    pub created_at_ms: u64,
    /// Cumulative statistics.
    pub stats: PlayerStats,
}

impl PlayerProfile {
    /// Create a fresh profile with zeroed statistics.
    pub fn new(id: impl Into<PlayerId>, display_name: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            created_at_ms: now_ms,
            stats: PlayerStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_extends_streak_and_best() {
        let mut stats = PlayerStats::default();
        stats.record(GameResult::Win);
        stats.record(GameResult::Win);

        assert_eq!(stats.games_won, 2);
        assert_eq!(stats.win_streak, 2);
        assert_eq!(stats.best_win_streak, 2);
    }

    #[test]
    fn loss_resets_streak_but_not_best() {
        let mut stats = PlayerStats::default();
        stats.record(GameResult::Win);
        stats.record(GameResult::Win);
        stats.record(GameResult::Loss);
        stats.record(GameResult::Win);

        assert_eq!(stats.win_streak, 1);
        assert_eq!(stats.best_win_streak, 2);
        assert_eq!(stats.games_lost, 1);
    }

    #[test]
    fn draw_resets_streak() {
        let mut stats = PlayerStats::default();
        stats.record(GameResult::Win);
        stats.record(GameResult::Draw);

        assert_eq!(stats.win_streak, 0);
        assert_eq!(stats.games_drawn, 1);
    }

    #[test]
    fn played_equals_sum_of_outcomes() {
        let mut stats = PlayerStats::default();
        for result in [
            GameResult::Win,
            GameResult::Loss,
            GameResult::Draw,
            GameResult::Win,
            GameResult::Loss,
        ] {
            stats.record(result);
        }

        assert_eq!(stats.games_played, stats.games_won + stats.games_lost + stats.games_drawn);
        assert_eq!(stats.games_played, 5);
    }
}
