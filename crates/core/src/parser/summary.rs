//! Game metadata and statistics derived from a replayed game

use std::collections::BTreeMap;

use serde::Serialize;
use shakmaty::{Chess, Position as _};

use crate::game::{GameLine, GameMove, PieceKind, Side};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Players {
    pub white: String,
    pub black: String,
    pub white_elo: Option<u16>,
    pub black_elo: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventInfo {
    pub name: String,
    pub site: String,
    pub date: String,
    pub round: String,
}

/// State of the board at the end of the recorded moves
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub current_fen: String,
    pub turn: Side,
    pub move_number: usize,
    pub half_moves: usize,
    pub is_game_over: bool,
    pub in_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub is_draw: bool,
    pub is_threefold_repetition: bool,
    pub is_insufficient_material: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Opening {
    pub eco: Option<String>,
    pub name: Option<String>,
    pub variation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub players: Players,
    pub event: EventInfo,
    pub game_state: GameState,
    pub time_control: Option<String>,
    pub opening: Opening,
}

impl GameInfo {
    pub(crate) fn from_game(header: &BTreeMap<String, String>, line: &GameLine, board: &Chess) -> Self {
        let tag = |name: &str| header.get(name).cloned();
        let known = |name: &str| tag(name).unwrap_or_else(|| "Unknown".to_string());
        let half_moves = line.moves.len();
        let reason = game_over_reason(line, board);

        GameInfo {
            players: Players {
                white: known("White"),
                black: known("Black"),
                white_elo: tag("WhiteElo").and_then(|v| v.parse().ok()),
                black_elo: tag("BlackElo").and_then(|v| v.parse().ok()),
            },
            event: EventInfo {
                name: known("Event"),
                site: known("Site"),
                date: known("Date"),
                round: known("Round"),
            },
            game_state: GameState {
                current_fen: line
                    .final_position()
                    .map(|p| p.fen.clone())
                    .unwrap_or_default(),
                turn: board.turn().into(),
                move_number: half_moves / 2 + 1,
                half_moves,
                is_game_over: reason.is_some(),
                in_check: board.is_check(),
                is_checkmate: reason == Some(GameOverReason::Checkmate),
                is_stalemate: reason == Some(GameOverReason::Stalemate),
                is_draw: matches!(
                    reason,
                    Some(
                        GameOverReason::Stalemate
                            | GameOverReason::ThreefoldRepetition
                            | GameOverReason::InsufficientMaterial
                            | GameOverReason::FiftyMoveRule
                    )
                ),
                is_threefold_repetition: reason == Some(GameOverReason::ThreefoldRepetition),
                is_insufficient_material: board.is_insufficient_material(),
            },
            time_control: tag("TimeControl"),
            opening: Opening {
                eco: tag("ECO"),
                name: tag("Opening"),
                variation: tag("Variation"),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Checkmate,
    Stalemate,
    ThreefoldRepetition,
    InsufficientMaterial,
    FiftyMoveRule,
}

/// Why the recorded moves end the game, if they do
pub fn game_over_reason(line: &GameLine, board: &Chess) -> Option<GameOverReason> {
    if board.is_checkmate() {
        Some(GameOverReason::Checkmate)
    } else if board.is_stalemate() {
        Some(GameOverReason::Stalemate)
    } else if board.is_insufficient_material() {
        Some(GameOverReason::InsufficientMaterial)
    } else if board.halfmoves() >= 100 {
        Some(GameOverReason::FiftyMoveRule)
    } else if line.final_position().is_some_and(|p| p.draw) {
        Some(GameOverReason::ThreefoldRepetition)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideCounts {
    pub white: usize,
    pub black: usize,
}

impl SideCounts {
    fn bump(&mut self, side: Side) {
        match side {
            Side::White => self.white += 1,
            Side::Black => self.black += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PieceCounts {
    pub pawn: usize,
    pub knight: usize,
    pub bishop: usize,
    pub rook: usize,
    pub queen: usize,
    pub king: usize,
}

impl PieceCounts {
    fn bump(&mut self, piece: PieceKind) {
        let slot = match piece {
            PieceKind::Pawn => &mut self.pawn,
            PieceKind::Knight => &mut self.knight,
            PieceKind::Bishop => &mut self.bishop,
            PieceKind::Rook => &mut self.rook,
            PieceKind::Queen => &mut self.queen,
            PieceKind::King => &mut self.king,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PieceActivity {
    pub white: PieceCounts,
    pub black: PieceCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatistics {
    pub total_moves: usize,
    pub total_ply_count: usize,
    pub captures_count: usize,
    /// Checks that did not mate
    pub checks_count: usize,
    pub castling_count: SideCounts,
    pub promotions_count: usize,
    pub piece_activity: PieceActivity,
}

impl GameStatistics {
    pub fn from_moves(moves: &[GameMove]) -> Self {
        let mut stats = GameStatistics {
            total_moves: moves.len(),
            total_ply_count: moves.len(),
            ..Default::default()
        };

        for mv in moves {
            if mv.captured.is_some() {
                stats.captures_count += 1;
            }
            if mv.check {
                stats.checks_count += 1;
            }
            if mv.castling.is_some() {
                stats.castling_count.bump(mv.side);
            }
            if mv.promotion.is_some() {
                stats.promotions_count += 1;
            }
            match mv.side {
                Side::White => stats.piece_activity.white.bump(mv.piece),
                Side::Black => stats.piece_activity.black.bump(mv.piece),
            }
        }

        stats
    }
}
