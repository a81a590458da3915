//! Per-ply analysis records

use serde::Serialize;

use crate::engine::Evaluation;
use crate::game::GameMove;
use crate::quality::{Classification, MoveQuality};

/// Lifecycle of one game analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Idle,
    Running,
    /// Every ply was analysed
    Completed,
    /// At least one ply carries an error instead of analysis
    PartiallyFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationPair {
    pub before: Option<Evaluation>,
    pub after: Option<Evaluation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlyAnalysis {
    pub before_position: String,
    pub after_position: String,
    /// Engine suggestion; withheld for the opponent's moves
    pub best_move: Option<String>,
    pub actual_move: String,
    pub evaluation: EvaluationPair,
    pub move_quality: MoveQuality,
    pub explanation: String,
    pub is_user_move: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PlyOutcome {
    Analyzed(PlyAnalysis),
    Failed { error: String },
}

/// One record per ply, in game order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlyRecord {
    /// 0-based ply index
    pub move_index: usize,
    #[serde(rename = "move")]
    pub mv: GameMove,
    #[serde(flatten)]
    pub outcome: PlyOutcome,
}

impl PlyRecord {
    pub fn analysis(&self) -> Option<&PlyAnalysis> {
        match &self.outcome {
            PlyOutcome::Analyzed(analysis) => Some(analysis),
            PlyOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            PlyOutcome::Failed { error } => Some(error),
            PlyOutcome::Analyzed(_) => None,
        }
    }

    pub fn classification(&self) -> Option<Classification> {
        self.analysis().map(|a| a.move_quality.classification)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAnalysis {
    pub status: RunStatus,
    pub records: Vec<PlyRecord>,
}

impl GameAnalysis {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for a 1-based ply number
    pub fn record(&self, ply: usize) -> Option<&PlyRecord> {
        ply.checked_sub(1).and_then(|idx| self.records.get(idx))
    }

    pub fn failed_plies(&self) -> usize {
        self.records.iter().filter(|r| r.error().is_some()).count()
    }

    /// How often each classification occurs; absent classes are omitted
    pub fn classification_counts(&self) -> Vec<(Classification, usize)> {
        Classification::ALL
            .iter()
            .map(|class| {
                let count = self
                    .records
                    .iter()
                    .filter(|r| r.classification() == Some(*class))
                    .count();
                (*class, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}
