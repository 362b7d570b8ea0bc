//! Session records and the per-match state machine.
//!
//! A [`Session`] is the canonical record of one match: seats, board, turn
//! marker, move log, outcome. [`Session::apply_move`] is the only mutation
//! after construction and enforces every invariant:
//!
//! - a finished session's board has no further mutations
//! - no slot is overwritten once occupied
//! - X moves first and turns strictly alternate, so the number of X marks
//!   minus O marks is always 0 or 1

use serde::{Deserialize, Serialize};

use crate::{
    board::{Board, Mark, Slot},
    error::EngineError,
    player::PlayerId,
    rules::{self, Verdict},
};

/// Unique session identifier (random, hex-rendered in logs).
pub type SessionId = u64;

/// One entry in a session's append-only move log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Identity that placed the mark.
    pub player: PlayerId,
    /// Mark placed.
    pub mark: Mark,
    /// Slot the mark was placed on.
    pub slot: Slot,
    /// Unix milliseconds when the move was applied.
    pub at_ms: u64,
}

/// Terminal result of a session.
///
/// A session with `outcome: None` is active; `Some` is finished. Collapsing
/// status, winner, and winning line into one field makes
/// "active with no outcome XOR finished with an outcome" hold by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// A seat completed a line.
    Won {
        /// The winning mark.
        mark: Mark,
        /// Slot indices of the completed line.
        line: [usize; 3],
    },
    /// Board filled with no line.
    Draw,
}

/// Canonical record of one match between two identities.
///
/// Seats are ordered: the first identity plays X, the second plays O. The
/// same identity may hold both seats (test artifacts); it then simply
/// alternates seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier.
    pub id: SessionId,
    /// Identity holding the X seat (moves first).
    pub player_x: PlayerId,
    /// Identity holding the O seat.
    pub player_o: PlayerId,
    /// Current board position.
    pub board: Board,
    /// Seat to move next. Meaningless once finished.
    pub turn: Mark,
    /// `None` while active; set exactly once, by the finishing move.
    pub outcome: Option<Outcome>,
    /// Append-only move log in application order.
    pub moves: Vec<MoveRecord>,
    /// Unix milliseconds at creation.
    pub created_at_ms: u64,
    /// Unix milliseconds of the most recent move (creation time if none).
    pub last_move_at_ms: u64,
}

impl Session {
    /// Start a new active session: empty board, X to move.
    pub fn new(
        id: SessionId,
        player_x: impl Into<PlayerId>,
        player_o: impl Into<PlayerId>,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            player_x: player_x.into(),
            player_o: player_o.into(),
            board: Board::new(),
            turn: Mark::X,
            outcome: None,
            moves: Vec::new(),
            created_at_ms: now_ms,
            last_move_at_ms: now_ms,
        }
    }

    /// Whether the session reached a terminal outcome.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Slot indices of the winning line, if a seat won.
    pub fn winning_line(&self) -> Option<[usize; 3]> {
        match self.outcome {
            Some(Outcome::Won { line, .. }) => Some(line),
            _ => None,
        }
    }

    /// The seat held by an identity. X is checked first, matching the
    /// ordered-seats rule.
    pub fn seat_of(&self, player: &str) -> Option<Mark> {
        if self.player_x == player {
            Some(Mark::X)
        } else if self.player_o == player {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Both seats' identities, deduplicated when one identity holds both.
    pub fn participants(&self) -> Vec<&PlayerId> {
        if self.player_x == self.player_o {
            vec![&self.player_x]
        } else {
            vec![&self.player_x, &self.player_o]
        }
    }

    /// Apply one move for `actor` at `slot`.
    ///
    /// On success the mark is placed, the move log appended, and the rules
    /// re-evaluated: either the outcome is recorded (session finished) or the
    /// turn marker flips. Returns the outcome reached by this move, `None`
    /// while the session continues.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SessionOver`] if already finished (board unchanged)
    /// - [`EngineError::PlayerNotFound`] if `actor` holds no seat
    /// - [`EngineError::SlotOccupied`] if the slot holds a mark
    /// - [`EngineError::WrongTurn`] if the actor's seat is not to move
    pub fn apply_move(
        &mut self,
        actor: &str,
        slot: Slot,
        now_ms: u64,
    ) -> Result<Option<Outcome>, EngineError> {
        if self.is_finished() {
            return Err(EngineError::SessionOver(self.id));
        }

        let mark = self
            .seat_of(actor)
            .ok_or_else(|| EngineError::PlayerNotFound(actor.to_owned()))?;

        if self.board.cell(slot).is_some() {
            return Err(EngineError::SlotOccupied(slot.index()));
        }

        if mark != self.turn {
            return Err(EngineError::WrongTurn(actor.to_owned()));
        }

        self.board.place(slot, mark);
        self.moves.push(MoveRecord { player: actor.to_owned(), mark, slot, at_ms: now_ms });
        self.last_move_at_ms = now_ms;

        match rules::evaluate(&self.board) {
            Verdict::Winner { mark, line } => {
                self.outcome = Some(Outcome::Won { mark, line });
            },
            Verdict::Draw => {
                self.outcome = Some(Outcome::Draw);
            },
            Verdict::InPlay => {
                self.turn = self.turn.opponent();
            },
        }

        Ok(self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: u8) -> Slot {
        Slot::new(index).unwrap()
    }

    fn session() -> Session {
        Session::new(1, "alice", "bob", 1_000)
    }

    #[test]
    fn new_session_is_active_with_x_to_move() {
        let s = session();
        assert!(!s.is_finished());
        assert_eq!(s.turn, Mark::X);
        assert!(s.moves.is_empty());
    }

    #[test]
    fn seats_are_ordered() {
        let s = session();
        assert_eq!(s.seat_of("alice"), Some(Mark::X));
        assert_eq!(s.seat_of("bob"), Some(Mark::O));
        assert_eq!(s.seat_of("mallory"), None);
    }

    #[test]
    fn turns_alternate() {
        let mut s = session();
        s.apply_move("alice", slot(0), 1_001).unwrap();
        assert_eq!(s.turn, Mark::O);
        s.apply_move("bob", slot(4), 1_002).unwrap();
        assert_eq!(s.turn, Mark::X);
    }

    #[test]
    fn wrong_turn_is_rejected_without_mutation() {
        let mut s = session();
        let before = s.clone();

        let err = s.apply_move("bob", slot(0), 1_001).unwrap_err();
        assert_eq!(err, EngineError::WrongTurn("bob".to_owned()));
        assert_eq!(s, before);
    }

    #[test]
    fn occupied_slot_is_rejected_without_mutation() {
        let mut s = session();
        s.apply_move("alice", slot(0), 1_001).unwrap();
        let before = s.clone();

        let err = s.apply_move("bob", slot(0), 1_002).unwrap_err();
        assert_eq!(err, EngineError::SlotOccupied(0));
        assert_eq!(s, before);
    }

    #[test]
    fn occupied_check_precedes_turn_check() {
        let mut s = session();
        s.apply_move("alice", slot(0), 1_001).unwrap();

        // Alice again, onto her own mark: both checks would fire; occupancy wins.
        let err = s.apply_move("alice", slot(0), 1_002).unwrap_err();
        assert_eq!(err, EngineError::SlotOccupied(0));
    }

    #[test]
    fn outsider_is_rejected() {
        let mut s = session();
        let err = s.apply_move("mallory", slot(0), 1_001).unwrap_err();
        assert_eq!(err, EngineError::PlayerNotFound("mallory".to_owned()));
    }

    #[test]
    fn top_row_win_records_outcome_and_line() {
        let mut s = session();
        s.apply_move("alice", slot(0), 1).unwrap();
        s.apply_move("bob", slot(4), 2).unwrap();
        s.apply_move("alice", slot(1), 3).unwrap();
        s.apply_move("bob", slot(8), 4).unwrap();
        let outcome = s.apply_move("alice", slot(2), 5).unwrap();

        assert_eq!(outcome, Some(Outcome::Won { mark: Mark::X, line: [0, 1, 2] }));
        assert!(s.is_finished());
        assert_eq!(s.winning_line(), Some([0, 1, 2]));
        assert_eq!(s.moves.len(), 5);
    }

    #[test]
    fn finished_session_rejects_every_move() {
        let mut s = session();
        for (actor, index) in [("alice", 0), ("bob", 4), ("alice", 1), ("bob", 8), ("alice", 2)] {
            s.apply_move(actor, slot(index), 1).unwrap();
        }
        let before = s.clone();

        let err = s.apply_move("bob", slot(3), 2).unwrap_err();
        assert_eq!(err, EngineError::SessionOver(s.id));
        assert_eq!(s, before);
    }

    #[test]
    fn known_draw_sequence() {
        // Final board: X X O / O O X / X O X
        let mut s = session();
        let script = [
            ("alice", 0),
            ("bob", 2),
            ("alice", 1),
            ("bob", 3),
            ("alice", 5),
            ("bob", 4),
            ("alice", 6),
            ("bob", 7),
        ];
        for (actor, index) in script {
            assert_eq!(s.apply_move(actor, slot(index), 1).unwrap(), None);
        }
        let outcome = s.apply_move("alice", slot(8), 2).unwrap();

        assert_eq!(outcome, Some(Outcome::Draw));
        assert_eq!(s.winning_line(), None);
    }

    #[test]
    fn mark_balance_holds_throughout() {
        let mut s = session();
        let script = [("alice", 0), ("bob", 2), ("alice", 1), ("bob", 3)];
        for (actor, index) in script {
            let x = s.board.count(Mark::X);
            let o = s.board.count(Mark::O);
            assert!(x == o || x == o + 1);
            s.apply_move(actor, slot(index), 1).unwrap();
        }
    }

    #[test]
    fn self_play_owns_the_x_seat_only() {
        // An identity holding both seats always resolves to X (seats are
        // checked in order), so its second move is out of turn.
        let mut s = Session::new(2, "solo", "solo", 0);
        s.apply_move("solo", slot(0), 1).unwrap();
        assert_eq!(s.moves[0].mark, Mark::X);

        let err = s.apply_move("solo", slot(1), 2).unwrap_err();
        assert_eq!(err, EngineError::WrongTurn("solo".to_owned()));
    }
}
