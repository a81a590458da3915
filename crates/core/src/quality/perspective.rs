//! Evaluation perspective
//!
//! Engines score a position for whoever is to move in it. Comparing the
//! position before a move with the one after it therefore needs both scores
//! re-expressed for the player who made the move.

use crate::engine::Evaluation;
use crate::game::Side;

/// Effective centipawns of `eval` for `mover`, given the side to move in the
/// evaluated position. Mates collapse to ±10000.
pub fn normalize_for_mover(eval: Evaluation, side_to_move: Side, mover: Side) -> i32 {
    let value = eval.effective_centipawns();
    if side_to_move == mover {
        value
    } else {
        -value
    }
}
