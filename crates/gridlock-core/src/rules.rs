//! Win and draw detection.
//!
//! Pure functions over [`Board`]: no state, no I/O, O(1) (a fixed
//! eight-line scan). The session state machine re-evaluates after every
//! placement; everything else trusts the verdict recorded on the session.

use crate::board::{Board, Mark};

/// The eight winning lines: three rows, three columns, two diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Result of evaluating a board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A mark holds three in a row on `line`.
    Winner {
        /// The winning mark.
        mark: Mark,
        /// Slot indices of the completed line.
        line: [usize; 3],
    },
    /// Board is full with no winning line.
    Draw,
    /// Moves remain and nobody has won.
    InPlay,
}

/// Evaluate a board: winner, draw, or still in play.
///
/// Scans the eight fixed lines in table order and reports the first
/// completed one. Legal play cannot produce two winning lines for different
/// marks, so first-match is unambiguous.
pub fn evaluate(board: &Board) -> Verdict {
    for line in WINNING_LINES {
        let [a, b, c] = line;
        if let Some(mark) = board.at(a) {
            if board.at(b) == Some(mark) && board.at(c) == Some(mark) {
                return Verdict::Winner { mark, line };
            }
        }
    }

    if board.is_full() { Verdict::Draw } else { Verdict::InPlay }
}
