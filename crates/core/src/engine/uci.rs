//! UCI line protocol
//!
//! Parsing of engine output lines, command formatting, and the line readers
//! used by the session. Readers work on any `AsyncBufRead` so they can be
//! driven by an in-memory buffer as well as a child process.

use tokio::io::{AsyncBufRead, Lines};
use tracing::trace;

use super::analysis::{EngineResult, Evaluation, SearchLimits};
use crate::error::{Error, Result};

/// One line of engine output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    Info(InfoLine),
    /// `bestmove (none)` is reported as `None`
    BestMove { mv: Option<String>, ponder: Option<String> },
    /// Anything else (banners, option listings, blank lines)
    Other,
}

/// Fields of a single `info` line; absent fields stay `None`/empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
    pub score: Option<Evaluation>,
    pub pv: Vec<String>,
}

pub fn parse_line(line: &str) -> EngineLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => EngineLine::UciOk,
        Some(&"readyok") => EngineLine::ReadyOk,
        Some(&"id") if tokens.len() >= 3 => EngineLine::Id {
            name: tokens[1].to_string(),
            value: tokens[2..].join(" "),
        },
        Some(&"bestmove") => {
            let mv = tokens
                .get(1)
                .filter(|mv| **mv != "(none)")
                .map(|mv| mv.to_string());
            let ponder = match tokens.get(2) {
                Some(&"ponder") => tokens.get(3).map(|mv| mv.to_string()),
                _ => None,
            };
            EngineLine::BestMove { mv, ponder }
        }
        Some(&"info") => EngineLine::Info(parse_info(&tokens[1..])),
        _ => EngineLine::Other,
    }
}

fn parse_info(tokens: &[&str]) -> InfoLine {
    let mut info = InfoLine::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                info.depth = tokens.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "nodes" => {
                info.nodes = tokens.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "nps" => {
                info.nps = tokens.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "time" => {
                info.time_ms = tokens.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "score" => {
                let value = tokens.get(i + 2).and_then(|s| s.parse::<i32>().ok());
                info.score = match (tokens.get(i + 1), value) {
                    (Some(&"cp"), Some(cp)) => Some(Evaluation::Centipawns(cp)),
                    (Some(&"mate"), Some(n)) => Some(Evaluation::Mate(n)),
                    _ => info.score,
                };
                i += 3;
            }
            "pv" => {
                info.pv = tokens[i + 1..].iter().map(|s| s.to_string()).collect();
                break;
            }
            // free text runs to the end of the line
            "string" => break,
            _ => i += 1,
        }
    }

    info
}

/// Accumulates `info` lines of one search until `bestmove` arrives.
///
/// Later lines overwrite earlier ones field by field, so the result reflects
/// the deepest iteration the engine reported.
#[derive(Debug, Clone, Default)]
pub struct SearchProgress {
    depth: u32,
    nodes: u64,
    nps: u64,
    time_ms: u64,
    score: Option<Evaluation>,
    pv: Vec<String>,
}

impl SearchProgress {
    pub fn update(&mut self, info: &InfoLine) {
        // `info string ...` and `info currmove ...` carry no search state
        let Some(depth) = info.depth else {
            return;
        };
        self.depth = depth;
        if let Some(nodes) = info.nodes {
            self.nodes = nodes;
        }
        if let Some(nps) = info.nps {
            self.nps = nps;
        }
        if let Some(time_ms) = info.time_ms {
            self.time_ms = time_ms;
        }
        if info.score.is_some() {
            self.score = info.score;
        }
        if !info.pv.is_empty() {
            self.pv = info.pv.clone();
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn finish(self, best_move: Option<String>) -> EngineResult {
        EngineResult {
            best_move: best_move.unwrap_or_default(),
            evaluation: self.score,
            depth: self.depth,
            nodes: self.nodes,
            nps: self.nps,
            pv: self.pv,
            time_ms: self.time_ms,
        }
    }
}

pub fn position_command(fen: &str) -> String {
    format!("position fen {}", fen.trim())
}

pub fn go_command(limits: &SearchLimits) -> String {
    format!("go depth {} movetime {}", limits.depth, limits.movetime_ms)
}

/// Reads until `readyok`, returning the engine's `id name` if it sent one
pub async fn wait_for_ready<R>(lines: &mut Lines<R>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut engine_name = None;
    while let Some(line) = lines.next_line().await? {
        trace!("UCI << {}", line);
        match parse_line(&line) {
            EngineLine::Id { name, value } if name == "name" => engine_name = Some(value),
            EngineLine::ReadyOk => return Ok(engine_name),
            _ if line.contains("readyok") => return Ok(engine_name),
            _ => {}
        }
    }
    Err(Error::EngineUnavailable(
        "engine exited during the handshake".to_string(),
    ))
}

/// Folds output into a [`SearchProgress`] until the terminal `bestmove` line
pub async fn read_search<R>(lines: &mut Lines<R>) -> Result<EngineResult>
where
    R: AsyncBufRead + Unpin,
{
    let mut progress = SearchProgress::default();
    while let Some(line) = lines.next_line().await? {
        trace!("UCI << {}", line);
        match parse_line(&line) {
            EngineLine::Info(info) => progress.update(&info),
            EngineLine::BestMove { mv, .. } => return Ok(progress.finish(mv)),
            _ => {}
        }
    }
    Err(Error::AnalysisFailed(
        "engine closed its output before reporting a best move".to_string(),
    ))
}

/// Discards output up to and including the next `bestmove` line
pub async fn drain_until_bestmove<R>(lines: &mut Lines<R>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        trace!("UCI << (discarded) {}", line);
        if matches!(parse_line(&line), EngineLine::BestMove { .. }) {
            return Ok(());
        }
    }
    Err(Error::AnalysisFailed(
        "engine closed its output while stopping a search".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[test]
    fn test_parse_info_line() {
        let line = "info depth 12 seldepth 17 multipv 1 score cp 35 nodes 120345 nps 980000 time 123 pv e2e4 e7e5 g1f3";
        let EngineLine::Info(info) = parse_line(line) else {
            panic!("expected info line");
        };
        assert_eq!(info.depth, Some(12));
        assert_eq!(info.score, Some(Evaluation::Centipawns(35)));
        assert_eq!(info.nodes, Some(120345));
        assert_eq!(info.nps, Some(980000));
        assert_eq!(info.time_ms, Some(123));
        assert_eq!(info.pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn test_parse_mate_and_bounds() {
        let EngineLine::Info(info) = parse_line("info depth 20 score mate -3 lowerbound nodes 5") else {
            panic!("expected info line");
        };
        assert_eq!(info.score, Some(Evaluation::Mate(-3)));
        assert_eq!(info.nodes, Some(5));
    }

    #[test]
    fn test_parse_info_string_stops() {
        let EngineLine::Info(info) = parse_line("info string NNUE evaluation using nn.nnue depth 99") else {
            panic!("expected info line");
        };
        assert_eq!(info, InfoLine::default());
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(
            parse_line("bestmove e2e4 ponder e7e5"),
            EngineLine::BestMove {
                mv: Some("e2e4".into()),
                ponder: Some("e7e5".into())
            }
        );
        assert_eq!(
            parse_line("bestmove (none)"),
            EngineLine::BestMove { mv: None, ponder: None }
        );
        assert_eq!(parse_line("Stockfish 16 by the Stockfish developers"), EngineLine::Other);
        assert_eq!(parse_line(""), EngineLine::Other);
    }

    #[test]
    fn test_progress_keeps_deepest_values() {
        let mut progress = SearchProgress::default();
        for line in [
            "info depth 1 score cp 10 nodes 20 nps 2000 pv d2d4",
            "info depth 2 currmove e2e4 currmovenumber 1",
            "info string only noise here",
            "info depth 2 score cp 25 nodes 80 nps 4000 pv e2e4 e7e5",
        ] {
            if let EngineLine::Info(info) = parse_line(line) {
                progress.update(&info);
            }
        }
        let result = progress.finish(Some("e2e4".into()));
        assert_eq!(result.depth, 2);
        assert_eq!(result.evaluation, Some(Evaluation::Centipawns(25)));
        assert_eq!(result.nodes, 80);
        assert_eq!(result.nps, 4000);
        assert_eq!(result.pv, vec!["e2e4", "e7e5"]);
        assert_eq!(result.best_move, "e2e4");
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            position_command(" 8/8/8/8/8/8/8/K6k w - - 0 1 "),
            "position fen 8/8/8/8/8/8/8/K6k w - - 0 1"
        );
        assert_eq!(go_command(&SearchLimits::new(12, 3000)), "go depth 12 movetime 3000");
    }

    #[tokio::test]
    async fn test_wait_for_ready_captures_name() {
        let output = b"Stockfish 16\nid name Stockfish 16\nid author the developers\nuciok\nreadyok\n";
        let mut lines = BufReader::new(&output[..]).lines();
        let name = wait_for_ready(&mut lines).await.unwrap();
        assert_eq!(name.as_deref(), Some("Stockfish 16"));
    }

    #[tokio::test]
    async fn test_wait_for_ready_eof() {
        let mut lines = BufReader::new(&b"uciok\n"[..]).lines();
        let err = wait_for_ready(&mut lines).await.unwrap_err();
        assert!(matches!(err, Error::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn test_read_search_stops_at_bestmove() {
        let output = b"info depth 1 score cp 12 pv e2e4\nbestmove e2e4 ponder e7e5\ninfo depth 1 score cp -5 pv d7d5\nbestmove d7d5\n";
        let mut lines = BufReader::new(&output[..]).lines();

        let first = read_search(&mut lines).await.unwrap();
        assert_eq!(first.best_move, "e2e4");
        assert_eq!(first.evaluation, Some(Evaluation::Centipawns(12)));

        // the second search must only see its own output
        let second = read_search(&mut lines).await.unwrap();
        assert_eq!(second.best_move, "d7d5");
        assert_eq!(second.evaluation, Some(Evaluation::Centipawns(-5)));
    }

    #[tokio::test]
    async fn test_read_search_no_legal_moves() {
        let output = b"info depth 0 score mate 0\nbestmove (none)\n";
        let mut lines = BufReader::new(&output[..]).lines();
        let result = read_search(&mut lines).await.unwrap();
        assert!(result.best_move.is_empty());
        assert_eq!(result.evaluation, Some(Evaluation::Mate(0)));
    }

    #[tokio::test]
    async fn test_read_search_eof_fails() {
        let mut lines = BufReader::new(&b"info depth 3 score cp 1\n"[..]).lines();
        assert!(matches!(
            read_search(&mut lines).await,
            Err(Error::AnalysisFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_drain_discards_stale_search() {
        let output = b"info depth 9 score cp 40 pv g1f3\nbestmove g1f3\nreadyok\n";
        let mut lines = BufReader::new(&output[..]).lines();
        drain_until_bestmove(&mut lines).await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("readyok"));
    }
}
