//! Property-based tests for the session state machine.
//!
//! These verify the board invariants for all move sequences, not just the
//! scripted scenarios: mark balance, occupancy, turn alternation, and the
//! terminality of finished sessions.

use gridlock_core::{EngineError, Mark, Session, Slot};
use proptest::prelude::*;

fn slot(index: u8) -> Slot {
    Slot::new(index).unwrap()
}

/// Play a shuffled full-board order with the correct actor each turn,
/// stopping when the session finishes. Returns the session.
fn replay(order: &[u8]) -> Session {
    let mut session = Session::new(1, "alice", "bob", 0);
    for &index in order {
        if session.is_finished() {
            break;
        }
        let actor = match session.turn {
            Mark::X => "alice",
            Mark::O => "bob",
        };
        session.apply_move(actor, slot(index), 1).unwrap();
    }
    session
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Mark balance: X count minus O count is always 0 or 1, at every
    /// prefix of every legal game.
    #[test]
    fn prop_mark_balance_holds(order in Just((0u8..9).collect::<Vec<_>>()).prop_shuffle()) {
        let mut session = Session::new(1, "alice", "bob", 0);
        for &index in &order {
            if session.is_finished() {
                break;
            }
            let actor = match session.turn {
                Mark::X => "alice",
                Mark::O => "bob",
            };
            session.apply_move(actor, slot(index), 1).unwrap();

            let x = session.board.count(Mark::X);
            let o = session.board.count(Mark::O);
            prop_assert!(x == o || x == o + 1, "balance violated: {x} X vs {o} O");
        }
    }

    /// Every legal full-board order terminates in an outcome, and the move
    /// log length equals the number of occupied slots.
    #[test]
    fn prop_games_terminate(order in Just((0u8..9).collect::<Vec<_>>()).prop_shuffle()) {
        let session = replay(&order);

        prop_assert!(session.is_finished());
        let occupied = session.board.count(Mark::X) + session.board.count(Mark::O);
        prop_assert_eq!(session.moves.len(), occupied);
    }

    /// Replaying any already-occupied slot fails with `SlotOccupied` and
    /// leaves the record untouched. Occupancy is checked before turn
    /// ownership, so either participant trips it.
    #[test]
    fn prop_occupied_slot_never_overwritten(
        prefix in Just((0u8..9).collect::<Vec<_>>()).prop_shuffle(),
        cut in 1usize..9,
        pick in 0usize..9,
        actor_is_x in any::<bool>(),
    ) {
        let mut session = Session::new(1, "alice", "bob", 0);
        for &index in prefix.iter().take(cut) {
            if session.is_finished() {
                break;
            }
            let actor = match session.turn {
                Mark::X => "alice",
                Mark::O => "bob",
            };
            session.apply_move(actor, slot(index), 1).unwrap();
        }
        prop_assume!(!session.is_finished());

        let replayed = session.moves[pick % session.moves.len()].slot;
        let before = session.clone();

        let actor = if actor_is_x { "alice" } else { "bob" };
        let err = session.apply_move(actor, replayed, 2).unwrap_err();
        prop_assert_eq!(err, EngineError::SlotOccupied(replayed.index()));
        prop_assert_eq!(session, before);
    }

    /// The off-turn player is always rejected with `WrongTurn` on any empty
    /// slot, with no mutation.
    #[test]
    fn prop_wrong_actor_rejected(
        prefix in Just((0u8..9).collect::<Vec<_>>()).prop_shuffle(),
        cut in 0usize..6,
    ) {
        let mut session = Session::new(1, "alice", "bob", 0);
        for &index in prefix.iter().take(cut) {
            if session.is_finished() {
                break;
            }
            let actor = match session.turn {
                Mark::X => "alice",
                Mark::O => "bob",
            };
            session.apply_move(actor, slot(index), 1).unwrap();
        }
        prop_assume!(!session.is_finished());

        let off_turn = match session.turn {
            Mark::X => "bob",
            Mark::O => "alice",
        };
        // An unfinished session always has an empty slot.
        let empty = Slot::all().find(|s| session.board.cell(*s).is_none()).unwrap();

        let before = session.clone();
        let err = session.apply_move(off_turn, empty, 2).unwrap_err();
        prop_assert_eq!(err, EngineError::WrongTurn(off_turn.to_owned()));
        prop_assert_eq!(session, before);
    }

    /// Once finished, every further move fails with `SessionOver` and the
    /// board never changes again.
    #[test]
    fn prop_finished_is_terminal(
        order in Just((0u8..9).collect::<Vec<_>>()).prop_shuffle(),
        extra in 0u8..9,
        actor_is_x in any::<bool>(),
    ) {
        let mut session = replay(&order);
        let before = session.clone();

        let actor = if actor_is_x { "alice" } else { "bob" };
        let err = session.apply_move(actor, slot(extra), 2).unwrap_err();
        prop_assert_eq!(err, EngineError::SessionOver(session.id));
        prop_assert_eq!(session, before);
    }
}
