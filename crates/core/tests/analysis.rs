//! End-to-end game analysis against a scripted analyzer

use std::time::Duration;

use async_trait::async_trait;
use chess_coach_core::game::sequence_moves;
use chess_coach_core::{
    analyze_line, Classification, EngineResult, Error, Evaluation, PositionAnalyzer, Result,
    RunStatus, SearchLimits, Side,
};

/// Replays canned answers in call order; failures are injected by call index
struct ScriptedAnalyzer {
    answers: Vec<(String, Evaluation)>,
    fail_calls: Vec<usize>,
    unavailable: bool,
    calls: usize,
}

impl ScriptedAnalyzer {
    fn constant(best: &str, eval: Evaluation) -> Self {
        ScriptedAnalyzer {
            answers: vec![(best.to_string(), eval)],
            fail_calls: Vec::new(),
            unavailable: false,
            calls: 0,
        }
    }

    fn scripted(answers: &[(&str, Evaluation)]) -> Self {
        ScriptedAnalyzer {
            answers: answers.iter().map(|(m, e)| (m.to_string(), *e)).collect(),
            fail_calls: Vec::new(),
            unavailable: false,
            calls: 0,
        }
    }
}

#[async_trait]
impl PositionAnalyzer for ScriptedAnalyzer {
    async fn ensure_ready(&mut self) -> Result<()> {
        if self.unavailable {
            return Err(Error::EngineUnavailable("stockfish: not found".to_string()));
        }
        Ok(())
    }

    async fn analyze_position(&mut self, _fen: &str, _limits: SearchLimits) -> Result<EngineResult> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_calls.contains(&call) {
            return Err(Error::AnalysisTimeout(Duration::from_millis(3000)));
        }

        let (best, eval) = self.answers[call.min(self.answers.len() - 1)].clone();
        Ok(EngineResult {
            best_move: best.clone(),
            evaluation: Some(eval),
            depth: 12,
            nodes: 50_000,
            nps: 1_000_000,
            pv: vec![best],
            time_ms: 50,
        })
    }
}

#[tokio::test]
async fn test_single_best_move() {
    let line = sequence_moves(&["e4"]).unwrap();
    let mut analyzer = ScriptedAnalyzer::scripted(&[
        ("e2e4", Evaluation::Centipawns(30)),
        ("e7e5", Evaluation::Centipawns(-30)),
    ]);

    let analysis = analyze_line(&mut analyzer, &line, Side::White, SearchLimits::game())
        .await
        .unwrap();

    assert_eq!(analysis.status, RunStatus::Completed);
    assert_eq!(analysis.len(), 1);
    let ply = analysis.record(1).unwrap().analysis().unwrap();
    assert!(ply.is_user_move);
    assert_eq!(ply.move_quality.classification, Classification::Best);
    assert_eq!(ply.move_quality.score, 0);
    assert_eq!(ply.best_move.as_deref(), Some("e2e4"));
    assert!(ply.explanation.starts_with("Perfect!"));
    assert!(!ply.explanation.contains("Better was"));
}

#[tokio::test]
async fn test_timeout_confined_to_one_ply() {
    let sans = ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4", "Nf6", "O-O", "Be7"];
    let line = sequence_moves(&sans).unwrap();
    let mut analyzer = ScriptedAnalyzer::constant("0000", Evaluation::Centipawns(0));
    // third ply's "before" request: plies 1 and 2 used calls 0..=3
    analyzer.fail_calls = vec![4];

    let analysis = analyze_line(&mut analyzer, &line, Side::White, SearchLimits::game())
        .await
        .unwrap();

    assert_eq!(analysis.status, RunStatus::PartiallyFailed);
    assert_eq!(analysis.len(), 10);
    assert_eq!(analysis.failed_plies(), 1);
    for record in &analysis.records {
        if record.move_index == 2 {
            assert!(record.error().unwrap().contains("timed out"));
            assert!(record.analysis().is_none());
        } else {
            assert!(record.analysis().is_some(), "ply {} missing", record.move_index);
        }
    }
    assert_eq!(analysis.records[2].mv.san, "Nf3");
}

#[tokio::test]
async fn test_opponent_moves_are_not_graded() {
    let line = sequence_moves(&["d4", "d5", "c4", "e6"]).unwrap();
    let mut analyzer = ScriptedAnalyzer::constant("g1f3", Evaluation::Centipawns(-400));

    let analysis = analyze_line(&mut analyzer, &line, Side::White, SearchLimits::game())
        .await
        .unwrap();

    assert_eq!(analysis.status, RunStatus::Completed);
    for record in &analysis.records {
        let ply = record.analysis().unwrap();
        if record.move_index % 2 == 1 {
            assert!(!ply.is_user_move);
            assert_eq!(ply.move_quality.classification, Classification::Opponent);
            assert_eq!(ply.move_quality.score, 0);
            assert!(ply.best_move.is_none());
            assert_eq!(ply.explanation, format!("Opponent played {}", record.mv.san));
        } else {
            assert!(ply.is_user_move);
            assert_ne!(ply.move_quality.classification, Classification::Opponent);
        }
    }

    let json = serde_json::to_value(&analysis.records[1]).unwrap();
    assert!(json["bestMove"].is_null());
    assert_eq!(json["moveQuality"]["classification"], "opponent");
}

#[tokio::test]
async fn test_black_perspective_blunder() {
    let line = sequence_moves(&["e4", "f6", "d4", "g5", "Qh5#"]).unwrap();
    // every ply requests before then after; scores are for the side to move
    let mut analyzer = ScriptedAnalyzer::scripted(&[
        ("e2e4", Evaluation::Centipawns(30)),
        ("e7e5", Evaluation::Centipawns(-30)),
        ("e7e5", Evaluation::Centipawns(-20)),
        ("d2d4", Evaluation::Centipawns(40)),
        ("d2d4", Evaluation::Centipawns(40)),
        ("e7e6", Evaluation::Centipawns(-20)),
        ("e7e6", Evaluation::Centipawns(-20)),
        ("d1h5", Evaluation::Mate(1)),
        ("d1h5", Evaluation::Mate(1)),
        ("", Evaluation::Mate(0)),
    ]);
    let analysis = analyze_line(&mut analyzer, &line, Side::Black, SearchLimits::game())
        .await
        .unwrap();

    let f6 = analysis.record(2).unwrap().analysis().unwrap();
    let g5 = analysis.record(4).unwrap().analysis().unwrap();
    // f6: Black goes from +20 for White to +40 for White
    assert_eq!(f6.move_quality.score, 20);
    assert_eq!(f6.move_quality.classification, Classification::Good);
    assert_eq!(g5.move_quality.classification, Classification::Blunder);
    assert!(g5.explanation.contains("Better was e7e6."));
    assert!(g5.explanation.contains("mating sequence"));
}

#[tokio::test]
async fn test_engine_unavailable_aborts_run() {
    let line = sequence_moves(&["e4", "e5"]).unwrap();
    let mut analyzer = ScriptedAnalyzer::constant("e2e4", Evaluation::Centipawns(0));
    analyzer.unavailable = true;

    let err = analyze_line(&mut analyzer, &line, Side::White, SearchLimits::game())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EngineUnavailable(_)));
    assert_eq!(analyzer.calls, 0);
}
