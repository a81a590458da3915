//! Move Quality Classifier

use std::fmt;

use serde::{Deserialize, Serialize};

use super::perspective::normalize_for_mover;
use crate::engine::{EngineResult, Evaluation};
use crate::game::GameMove;

/// Centipawn loss thresholds; each bound is exclusive
const EXCELLENT_BELOW: i32 = 10;
const GOOD_BELOW: i32 = 25;
const INACCURACY_BELOW: i32 = 50;
const MISTAKE_BELOW: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Best,
    Brilliant,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    Opponent,
    Unknown,
}

impl Classification {
    pub const ALL: [Classification; 9] = [
        Classification::Best,
        Classification::Brilliant,
        Classification::Excellent,
        Classification::Good,
        Classification::Inaccuracy,
        Classification::Mistake,
        Classification::Blunder,
        Classification::Opponent,
        Classification::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Best => "best",
            Classification::Brilliant => "brilliant",
            Classification::Excellent => "excellent",
            Classification::Good => "good",
            Classification::Inaccuracy => "inaccuracy",
            Classification::Mistake => "mistake",
            Classification::Blunder => "blunder",
            Classification::Opponent => "opponent",
            Classification::Unknown => "unknown",
        }
    }

    /// Plain threshold bucket for a centipawn loss
    pub fn from_eval_drop(eval_drop: i32) -> Self {
        if eval_drop < EXCELLENT_BELOW {
            Classification::Excellent
        } else if eval_drop < GOOD_BELOW {
            Classification::Good
        } else if eval_drop < INACCURACY_BELOW {
            Classification::Inaccuracy
        } else if eval_drop < MISTAKE_BELOW {
            Classification::Mistake
        } else {
            Classification::Blunder
        }
    }

    /// Moves worth pointing out when summarising a game
    pub fn is_significant(self) -> bool {
        matches!(
            self,
            Classification::Blunder
                | Classification::Mistake
                | Classification::Brilliant
                | Classification::Excellent
        )
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveQuality {
    pub classification: Classification,
    /// Centipawns lost by the move, from the mover's point of view
    pub score: i32,
}

impl MoveQuality {
    pub fn opponent() -> Self {
        MoveQuality {
            classification: Classification::Opponent,
            score: 0,
        }
    }

    pub fn unknown() -> Self {
        MoveQuality {
            classification: Classification::Unknown,
            score: 0,
        }
    }
}

/// Centipawn loss of `mv`: the position before it is scored with the mover to
/// move, the position after it with the opponent to move.
pub fn eval_drop(before: Evaluation, after: Evaluation, mv: &GameMove) -> i32 {
    let mover = mv.side;
    normalize_for_mover(before, mover, mover) - normalize_for_mover(after, mover.opposite(), mover)
}

/// Classifies a played move from the engine results before and after it.
///
/// Matching the engine's best move always yields `best`. Otherwise the loss
/// is bucketed, then two overrides apply: mating from a position already
/// scored as mate is `brilliant`, and a check costing under 50 is `good`.
pub fn classify_move(before: &EngineResult, after: &EngineResult, mv: &GameMove) -> MoveQuality {
    let (Some(before_eval), Some(after_eval)) = (before.evaluation, after.evaluation) else {
        return MoveQuality::unknown();
    };

    let drop = eval_drop(before_eval, after_eval, mv);

    let classification = if mv.matches_engine_move(&before.best_move) {
        Classification::Best
    } else if before_eval.is_mate() && mv.checkmate {
        Classification::Brilliant
    } else if mv.check && drop < INACCURACY_BELOW {
        Classification::Good
    } else {
        Classification::from_eval_drop(drop)
    };

    MoveQuality {
        classification,
        score: drop,
    }
}
