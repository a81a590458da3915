//! Game Analysis Orchestrator
//!
//! Walks a game ply by ply, scoring the position before and after every move
//! and classifying the designated player's moves.

mod types;

pub use types::{EvaluationPair, GameAnalysis, PlyAnalysis, PlyOutcome, PlyRecord, RunStatus};

use tracing::{debug, info, warn};

use crate::engine::{PositionAnalyzer, SearchLimits};
use crate::error::{Error, Result};
use crate::game::{GameLine, GameMove, Position, Side};
use crate::quality::{assess_move, assess_opponent_move};

/// Analyzes a sequenced game for `user_side`
pub async fn analyze_line<A>(
    analyzer: &mut A,
    line: &GameLine,
    user_side: Side,
    limits: SearchLimits,
) -> Result<GameAnalysis>
where
    A: PositionAnalyzer + ?Sized,
{
    analyze_game(analyzer, &line.moves, &line.positions, user_side, limits).await
}

/// Produces one record per move.
///
/// Both positions of a ply are evaluated fresh and strictly one after the
/// other. A failure confined to one ply is stored in that ply's record and
/// the run continues; an engine that cannot be started or never becomes
/// ready aborts the run. Inconsistent input is rejected before the engine
/// is touched.
pub async fn analyze_game<A>(
    analyzer: &mut A,
    moves: &[GameMove],
    positions: &[Position],
    user_side: Side,
    limits: SearchLimits,
) -> Result<GameAnalysis>
where
    A: PositionAnalyzer + ?Sized,
{
    validate_line(moves, positions)?;

    let mut analysis = GameAnalysis {
        status: RunStatus::Idle,
        records: Vec::with_capacity(moves.len()),
    };
    if moves.is_empty() {
        analysis.status = RunStatus::Completed;
        return Ok(analysis);
    }

    analyzer.ensure_ready().await?;
    analysis.status = RunStatus::Running;
    info!(
        "Analyzing {} plies for {} (depth {}, {} ms)",
        moves.len(),
        user_side,
        limits.depth,
        limits.movetime_ms
    );

    for (idx, mv) in moves.iter().enumerate() {
        let before = &positions[idx];
        let after = &positions[idx + 1];

        let outcome = match analyze_ply(analyzer, mv, before, after, user_side, limits).await {
            Ok(ply) => PlyOutcome::Analyzed(ply),
            Err(e) if e.is_session_failure() => {
                warn!("Engine lost at ply {}, aborting run: {}", idx + 1, e);
                return Err(e);
            }
            Err(e) => {
                warn!("Analysis failed for ply {} ({}): {}", idx + 1, mv.san, e);
                PlyOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        analysis.records.push(PlyRecord {
            move_index: idx,
            mv: mv.clone(),
            outcome,
        });
    }

    analysis.status = if analysis.failed_plies() > 0 {
        RunStatus::PartiallyFailed
    } else {
        RunStatus::Completed
    };
    info!(
        "Game analysis finished: {} plies, {} failed",
        analysis.len(),
        analysis.failed_plies()
    );
    Ok(analysis)
}

async fn analyze_ply<A>(
    analyzer: &mut A,
    mv: &GameMove,
    before: &Position,
    after: &Position,
    user_side: Side,
    limits: SearchLimits,
) -> Result<PlyAnalysis>
where
    A: PositionAnalyzer + ?Sized,
{
    let before_result = analyzer.analyze_position(&before.fen, limits).await?;
    let after_result = analyzer.analyze_position(&after.fen, limits).await?;

    let is_user_move = mv.side == user_side;
    let (assessment, best_move) = if is_user_move {
        (
            assess_move(&before_result, &after_result, mv),
            Some(before_result.best_move.clone()).filter(|m| !m.is_empty()),
        )
    } else {
        (assess_opponent_move(mv), None)
    };
    debug!(
        "Ply {} {}: {} ({})",
        mv.ply, mv.san, assessment.quality.classification, assessment.quality.score
    );

    Ok(PlyAnalysis {
        before_position: before.fen.clone(),
        after_position: after.fen.clone(),
        best_move,
        actual_move: mv.san.clone(),
        evaluation: EvaluationPair {
            before: before_result.evaluation,
            after: after_result.evaluation,
        },
        move_quality: assessment.quality,
        explanation: assessment.explanation,
        is_user_move,
    })
}

fn validate_line(moves: &[GameMove], positions: &[Position]) -> Result<()> {
    if positions.len() != moves.len() + 1 {
        return Err(Error::MalformedInput(format!(
            "expected {} positions for {} moves, got {}",
            moves.len() + 1,
            moves.len(),
            positions.len()
        )));
    }
    for (idx, mv) in moves.iter().enumerate() {
        if positions[idx].turn != mv.side {
            return Err(Error::MalformedInput(format!(
                "move {} ({}) is played by {} but {} is to move",
                idx + 1,
                mv.san,
                mv.side,
                positions[idx].turn
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineResult, Evaluation};
    use crate::game::sequence_moves;
    use async_trait::async_trait;

    /// Answers every request with a fixed result and counts calls
    struct FixedAnalyzer {
        calls: Vec<String>,
    }

    #[async_trait]
    impl PositionAnalyzer for FixedAnalyzer {
        async fn ensure_ready(&mut self) -> Result<()> {
            Ok(())
        }

        async fn analyze_position(&mut self, fen: &str, _limits: SearchLimits) -> Result<EngineResult> {
            self.calls.push(fen.to_string());
            Ok(EngineResult {
                best_move: "e2e4".to_string(),
                evaluation: Some(Evaluation::Centipawns(0)),
                depth: 1,
                nodes: 1,
                nps: 1,
                pv: vec!["e2e4".to_string()],
                time_ms: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_evaluates_before_then_after() {
        let line = sequence_moves(&["e4", "e5"]).unwrap();
        let mut analyzer = FixedAnalyzer { calls: Vec::new() };
        let analysis = analyze_line(&mut analyzer, &line, Side::White, SearchLimits::game())
            .await
            .unwrap();

        assert_eq!(analysis.status, RunStatus::Completed);
        assert_eq!(analysis.len(), 2);
        let fens: Vec<String> = [0, 1, 1, 2]
            .iter()
            .map(|i| line.positions[*i].fen.clone())
            .collect();
        assert_eq!(analyzer.calls, fens);

        let first = analysis.record(1).unwrap().analysis().unwrap();
        assert_eq!(first.best_move.as_deref(), Some("e2e4"));
        assert_eq!(first.move_quality.classification, crate::quality::Classification::Best);
    }

    #[tokio::test]
    async fn test_mismatched_lengths_rejected_before_engine() {
        let line = sequence_moves(&["e4", "e5"]).unwrap();
        let mut analyzer = FixedAnalyzer { calls: Vec::new() };
        let err = analyze_game(
            &mut analyzer,
            &line.moves,
            &line.positions[..2],
            Side::White,
            SearchLimits::game(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(analyzer.calls.is_empty());
    }

    #[tokio::test]
    async fn test_empty_game() {
        let line = sequence_moves::<&str>(&[]).unwrap();
        let mut analyzer = FixedAnalyzer { calls: Vec::new() };
        let analysis = analyze_line(&mut analyzer, &line, Side::Black, SearchLimits::game())
            .await
            .unwrap();
        assert!(analysis.is_empty());
        assert_eq!(analysis.status, RunStatus::Completed);
        assert!(analyzer.calls.is_empty());
    }

    #[tokio::test]
    async fn test_record_serialization_shape() {
        let line = sequence_moves(&["e4", "e5"]).unwrap();
        let mut analyzer = FixedAnalyzer { calls: Vec::new() };
        let mut analysis = analyze_line(&mut analyzer, &line, Side::White, SearchLimits::game())
            .await
            .unwrap();
        analysis.records[1].outcome = PlyOutcome::Failed {
            error: "Analysis timed out after 5s".to_string(),
        };

        let json = serde_json::to_value(&analysis.records).unwrap();
        assert_eq!(json[0]["moveIndex"], 0);
        assert_eq!(json[0]["move"]["san"], "e4");
        assert_eq!(json[0]["moveQuality"]["classification"], "best");
        assert_eq!(json[0]["evaluation"]["before"]["type"], "centipawn");
        assert_eq!(json[0]["isUserMove"], true);

        let failed = json[1].as_object().unwrap();
        let mut keys: Vec<&str> = failed.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["error", "move", "moveIndex"]);
    }
}
