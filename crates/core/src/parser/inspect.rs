//! Validation, diagnosis and position lookup for PGN input

use serde::Serialize;
use shakmaty::Position as _;

use super::pgn::read_first_game;
use crate::error::{Error, Result};
use crate::game::{move_to_uci, Side};

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Validation {
    fn ok() -> Self {
        Validation {
            valid: true,
            error: None,
        }
    }

    fn fail(error: impl Into<String>) -> Self {
        Validation {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Checks that the text looks like PGN and that its first game replays legally
pub fn validate_pgn(pgn: &str) -> Validation {
    let pgn = pgn.trim();
    if pgn.is_empty() {
        return Validation::fail("PGN text cannot be empty");
    }

    let mut has_headers = false;
    let mut has_moves = false;
    let mut has_result = false;
    for line in pgn.lines().map(str::trim) {
        if line.starts_with('[') && line.ends_with(']') {
            has_headers = true;
        }
        if looks_like_movetext(line) {
            has_moves = true;
        }
        if RESULT_TOKENS.iter().any(|r| line.ends_with(r)) {
            has_result = true;
        }
    }

    if !has_headers {
        return Validation::fail("PGN must contain header information in [Tag \"Value\"] format");
    }
    if !has_moves && !has_result {
        return Validation::fail("PGN must contain either moves or a result");
    }

    match read_first_game(pgn) {
        Ok(_) => Validation::ok(),
        Err(Error::Pgn(msg)) => Validation::fail(msg),
        Err(e) => Validation::fail(e.to_string()),
    }
}

/// A move number like `12.` or something starting like SAN
fn looks_like_movetext(line: &str) -> bool {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && line[digits..].starts_with('.') {
        return true;
    }
    line.chars()
        .next()
        .is_some_and(|c| "abcdefgh12345678NBRQK+#=-O".contains(c))
}

/// Board after a given full move, as shown when stepping through a game
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionAtMove {
    pub fen: String,
    pub turn: Side,
    pub move_number: usize,
    pub last_move: Option<String>,
    pub in_check: bool,
    /// Legal replies in engine notation
    pub possible_moves: Vec<String>,
}

/// Position after full move `move_number`, clamped to the end of the game
pub fn position_at_move(pgn: &str, move_number: usize) -> Result<PositionAtMove> {
    let game = read_first_game(pgn).map_err(|e| {
        Error::Pgn(format!("Failed to get position at move {}: {}", move_number, e))
    })?;
    let line = game.line;

    let position = line
        .position_after_move(move_number)
        .ok_or_else(|| Error::Pgn(format!("no position after move {}", move_number)))?;
    let board = position.to_chess()?;
    let last = line
        .plies_through_move(move_number)
        .checked_sub(1)
        .and_then(|idx| line.moves.get(idx));

    Ok(PositionAtMove {
        fen: position.fen.clone(),
        turn: position.turn,
        move_number: last.map_or(0, |mv| mv.move_number),
        last_move: last.map(|mv| mv.san.clone()),
        in_check: position.in_check,
        possible_moves: board.legal_moves().iter().map(move_to_uci).collect(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub possible_causes: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Likely causes and fixes for a PGN that failed to parse
pub fn diagnose(pgn: &str, error_message: &str) -> Diagnosis {
    let message = error_message.to_lowercase();
    let mut diagnosis = Diagnosis::default();

    if message.contains("invalid move") || message.contains("illegal move") {
        diagnosis
            .possible_causes
            .push("Invalid chess move notation".to_string());
        diagnosis
            .suggestions
            .push("Check move notation (e.g., e4, Nf3, O-O)".to_string());
        diagnosis
            .suggestions
            .push("Ensure moves are legal in the given position".to_string());
    }

    if message.contains("invalid fen") || message.contains("illegal position") {
        diagnosis
            .possible_causes
            .push("Invalid FEN string in PGN".to_string());
        diagnosis
            .suggestions
            .push("Check FEN tag format if present".to_string());
    }

    if message.contains("header") {
        diagnosis
            .possible_causes
            .push("Malformed PGN headers".to_string());
        diagnosis
            .suggestions
            .push("Ensure headers are in [Tag \"Value\"] format".to_string());
    }

    if pgn.len() < 50 {
        diagnosis
            .possible_causes
            .push("PGN appears to be incomplete".to_string());
        diagnosis
            .suggestions
            .push("Ensure complete PGN with headers and moves".to_string());
    }

    diagnosis
}
