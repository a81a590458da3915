//! Engine session against scripted UCI processes
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chess_coach_core::engine::SessionState;
use chess_coach_core::game::sequence_moves;
use chess_coach_core::{
    analyze_line, EngineSession, Error, Evaluation, PositionEvaluator, RunStatus, SearchLimits,
    Side,
};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Answers every search immediately
const PROMPT_ENGINE: &str = r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "id name FakeFish 1.0"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      echo "info depth 7 score cp 12 nodes 900 nps 45000 time 20 pv e2e4 e7e5"
      echo "info depth 8 score cp 25 nodes 1800 nps 60000 time 30 pv e2e4 e7e5 g1f3"
      echo "bestmove e2e4 ponder e7e5"
      ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Stalls on its first search until stopped, answers later ones at once
const STALL_ONCE_ENGINE: &str = r#"#!/bin/sh
searches=0
while read -r line; do
  case "$line" in
    uci) echo "id name Staller"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      searches=$((searches + 1))
      if [ "$searches" -gt 1 ]; then
        echo "info depth 9 score cp 77 nodes 4000 pv e2e4 c7c5"
        echo "bestmove e2e4"
      else
        echo "info depth 1 score cp -15 pv d2d4"
      fi
      ;;
    stop) echo "bestmove d2d4" ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Ignores `stop`, so an interrupted search never finishes
const DEAF_ENGINE: &str = r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "id name Deaf"; echo "uciok" ;;
    isready) echo "readyok" ;;
    quit) exit 0 ;;
  esac
done
"#;

/// The first process ever started dies in its first search; later ones answer
const CRASH_ONCE_ENGINE: &str = r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "id name Crashy"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      if [ ! -e "$0.crashed" ]; then
        : > "$0.crashed"
        exit 1
      fi
      echo "info depth 6 score cp 40 pv g1f3"
      echo "bestmove g1f3"
      ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Every process dies in its second search
const CRASH_SECOND_ENGINE: &str = r#"#!/bin/sh
searches=0
while read -r line; do
  case "$line" in
    uci) echo "id name Fragile"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      searches=$((searches + 1))
      if [ "$searches" -ge 2 ]; then
        exit 1
      fi
      echo "info depth 5 score cp 10 pv e2e4"
      echo "bestmove e2e4"
      ;;
    quit) exit 0 ;;
  esac
done
"#;

fn write_engine(name: &str, script: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("coach-{}-{}.sh", name, std::process::id()));
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn marker(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.crashed", path.display()))
}

// All scripts are written before any process is spawned in this binary.
#[tokio::test]
async fn test_scripted_engines() {
    let prompt = write_engine("prompt", PROMPT_ENGINE);
    let stall_once = write_engine("stall-once", STALL_ONCE_ENGINE);
    let deaf = write_engine("deaf", DEAF_ENGINE);
    let crash_once = write_engine("crash-once", CRASH_ONCE_ENGINE);
    let crash_second = write_engine("crash-second", CRASH_SECOND_ENGINE);
    let _ = fs::remove_file(marker(&crash_once));

    completes_search(&prompt).await;
    next_search_after_timeout_gets_its_own_answer(&stall_once).await;
    engine_ignoring_stop_is_replaced(&deaf).await;
    crashed_engine_is_restarted(&crash_once).await;
    crashes_stay_confined_to_their_ply(&crash_second).await;

    let _ = fs::remove_file(marker(&crash_once));
    for path in [prompt, stall_once, deaf, crash_once, crash_second] {
        let _ = fs::remove_file(path);
    }
}

async fn completes_search(path: &Path) {
    let mut session = EngineSession::new(path.to_string_lossy());
    assert_eq!(session.state(), SessionState::Uninitialized);

    let result = session
        .analyze(START_FEN, &SearchLimits::new(8, 500))
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.engine_name(), Some("FakeFish 1.0"));

    assert_eq!(result.best_move, "e2e4");
    assert_eq!(result.evaluation, Some(Evaluation::Centipawns(25)));
    assert_eq!(result.depth, 8);
    assert_eq!(result.nodes, 1800);
    assert_eq!(result.pv, vec!["e2e4", "e7e5", "g1f3"]);

    // the session is reused for the next request
    let again = session
        .analyze(START_FEN, &SearchLimits::new(8, 500))
        .await
        .unwrap();
    assert_eq!(again.best_move, "e2e4");

    session.stop().await;
    assert_eq!(session.state(), SessionState::Stopped);
}

async fn next_search_after_timeout_gets_its_own_answer(path: &Path) {
    let mut session =
        EngineSession::new(path.to_string_lossy()).with_ready_timeout(Duration::from_secs(5));

    let err = session
        .analyze(START_FEN, &SearchLimits::new(20, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AnalysisTimeout(_)), "got {:?}", err);
    assert_eq!(session.state(), SessionState::Ready);

    // the interrupted search's `bestmove d2d4` was drained, not handed over
    let result = session
        .analyze(START_FEN, &SearchLimits::new(9, 500))
        .await
        .unwrap();
    assert_eq!(result.best_move, "e2e4");
    assert_eq!(result.evaluation, Some(Evaluation::Centipawns(77)));
    assert_eq!(result.depth, 9);
    assert_eq!(session.engine_name(), Some("Staller"));

    session.stop().await;
    assert_eq!(session.state(), SessionState::Stopped);
}

async fn engine_ignoring_stop_is_replaced(path: &Path) {
    let mut session = EngineSession::new(path.to_string_lossy());

    let err = session
        .analyze(START_FEN, &SearchLimits::new(20, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AnalysisTimeout(_)), "got {:?}", err);
    // killed rather than left mid-search
    assert_eq!(session.state(), SessionState::Uninitialized);

    // a fresh process completes the handshake again
    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    session.stop().await;
}

async fn crashed_engine_is_restarted(path: &Path) {
    let mut session = EngineSession::new(path.to_string_lossy());

    let err = session
        .analyze(START_FEN, &SearchLimits::new(6, 500))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AnalysisFailed(_)), "got {:?}", err);
    assert_eq!(session.state(), SessionState::Uninitialized);

    let result = session
        .analyze(START_FEN, &SearchLimits::new(6, 500))
        .await
        .unwrap();
    assert_eq!(result.best_move, "g1f3");
    assert_eq!(result.evaluation, Some(Evaluation::Centipawns(40)));
    assert_eq!(session.state(), SessionState::Ready);

    session.stop().await;
}

async fn crashes_stay_confined_to_their_ply(path: &Path) {
    let session = EngineSession::new(path.to_string_lossy());
    let mut evaluator = PositionEvaluator::new(session);
    let line = sequence_moves(&["e4", "e5", "Nf3"]).unwrap();

    // each ply's "before" search succeeds on a fresh process, its "after" search kills it
    let analysis = analyze_line(&mut evaluator, &line, Side::White, SearchLimits::new(5, 200))
        .await
        .unwrap();

    assert_eq!(analysis.status, RunStatus::PartiallyFailed);
    assert_eq!(analysis.len(), 3);
    for record in &analysis.records {
        let error = record.error().unwrap();
        assert!(error.contains("best move"), "ply {}: {}", record.move_index, error);
    }

    evaluator.stop().await;
}
