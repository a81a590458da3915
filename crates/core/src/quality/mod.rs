//! Move quality: classification of played moves and their explanations

mod classify;
mod explain;
mod perspective;

pub use classify::{classify_move, eval_drop, Classification, MoveQuality};
pub use explain::{explain_move, explain_opponent_move};
pub use perspective::normalize_for_mover;

use crate::engine::EngineResult;
use crate::game::GameMove;

/// Classification together with its generated explanation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAssessment {
    pub quality: MoveQuality,
    pub explanation: String,
}

/// Classifies and explains one of the user's moves. Pure: the same inputs
/// always produce the same assessment.
pub fn assess_move(before: &EngineResult, after: &EngineResult, mv: &GameMove) -> MoveAssessment {
    let quality = classify_move(before, after, mv);
    let explanation = explain_move(before, after, mv, &quality);
    MoveAssessment {
        quality,
        explanation,
    }
}

/// Label for a move made by the other side; no engine reasoning involved
pub fn assess_opponent_move(mv: &GameMove) -> MoveAssessment {
    MoveAssessment {
        quality: MoveQuality::opponent(),
        explanation: explain_opponent_move(mv),
    }
}
