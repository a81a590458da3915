//! Types for representing engine analysis results

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Effective centipawn value of a forced mate
pub const MATE_SCORE: i32 = 10_000;

/// Extra time granted to the engine beyond its own move-time budget
pub const RESPONSE_GRACE: Duration = Duration::from_millis(2000);

/// Represents a position evaluation.
///
/// Always expressed from the perspective of the side to move in the
/// evaluated position, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Evaluation {
    /// Centipawn score (positive = side to move is better)
    #[serde(rename = "centipawn")]
    Centipawns(i32),
    /// Forced mate in N (positive = side to move mates, non-positive = side to move is mated)
    #[serde(rename = "mate")]
    Mate(i32),
}

impl Evaluation {
    pub fn is_mate(&self) -> bool {
        matches!(self, Evaluation::Mate(_))
    }

    /// Collapses mate scores to ±[`MATE_SCORE`]
    pub fn effective_centipawns(&self) -> i32 {
        match self {
            Evaluation::Centipawns(cp) => *cp,
            Evaluation::Mate(moves) if *moves > 0 => MATE_SCORE,
            Evaluation::Mate(_) => -MATE_SCORE,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(cp) => write!(f, "{:.2}", *cp as f32 / 100.0),
            Evaluation::Mate(moves) => {
                if *moves > 0 {
                    write!(f, "+M{}", moves)
                } else {
                    write!(f, "-M{}", moves.abs())
                }
            }
        }
    }
}

/// Depth and wall-clock budget for one search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLimits {
    pub depth: u32,
    pub movetime_ms: u64,
}

impl SearchLimits {
    pub fn new(depth: u32, movetime_ms: u64) -> Self {
        SearchLimits {
            depth: depth.max(1),
            movetime_ms,
        }
    }

    /// Per-ply budget used for whole-game analysis
    pub fn game() -> Self {
        SearchLimits::new(12, 3000)
    }

    /// Budget for a single interactive position
    pub fn position() -> Self {
        SearchLimits::new(15, 5000)
    }

    /// Availability probe
    pub fn probe() -> Self {
        SearchLimits::new(5, 1000)
    }

    /// How long to wait for `bestmove` before giving up
    pub fn response_deadline(&self) -> Duration {
        Duration::from_millis(self.movetime_ms) + RESPONSE_GRACE
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits::position()
    }
}

/// Complete engine answer for one position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResult {
    /// Best move in engine notation; empty when the position has no legal moves
    pub best_move: String,
    /// Latest reported score, if the engine sent one
    pub evaluation: Option<Evaluation>,
    /// Depth actually reached
    pub depth: u32,
    pub nodes: u64,
    pub nps: u64,
    /// Principal variation (best line of play)
    #[serde(rename = "principalVariation")]
    pub pv: Vec<String>,
    /// Time the engine reported spending (milliseconds)
    pub time_ms: u64,
}

impl EngineResult {
    /// Returns a brief summary of the analysis
    pub fn summary(&self) -> String {
        let eval = self
            .evaluation
            .map(|e| e.to_string())
            .unwrap_or_else(|| "?".to_string());
        format!(
            "Eval: {} | Best: {} | Depth: {} | PV: {}",
            eval,
            self.best_move,
            self.depth,
            self.pv.iter().take(5).cloned().collect::<Vec<_>>().join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Evaluation::Centipawns(35).to_string(), "0.35");
        assert_eq!(Evaluation::Centipawns(-120).to_string(), "-1.20");
        assert_eq!(Evaluation::Mate(3).to_string(), "+M3");
        assert_eq!(Evaluation::Mate(-2).to_string(), "-M2");
    }

    #[test]
    fn test_effective_centipawns() {
        assert_eq!(Evaluation::Centipawns(-40).effective_centipawns(), -40);
        assert_eq!(Evaluation::Mate(4).effective_centipawns(), MATE_SCORE);
        assert_eq!(Evaluation::Mate(-1).effective_centipawns(), -MATE_SCORE);
        // mate 0: the side to move is already mated
        assert_eq!(Evaluation::Mate(0).effective_centipawns(), -MATE_SCORE);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Evaluation::Centipawns(35)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "centipawn", "value": 35 }));

        let mate: Evaluation = serde_json::from_str(r#"{"type":"mate","value":3}"#).unwrap();
        assert_eq!(mate, Evaluation::Mate(3));
    }

    #[test]
    fn test_response_deadline() {
        let limits = SearchLimits::game();
        assert_eq!(limits.response_deadline(), Duration::from_millis(5000));
        assert_eq!(SearchLimits::new(0, 100).depth, 1);
    }
}
