//! Sides, pieces, moves and positions shared by every stage of the analysis

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::{fen::Fen, CastlingMode, Chess, Color, EnPassantMode, Position as _, Role};

use crate::error::{Error, Result};

/// One side of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Side::White),
            "black" | "b" => Ok(Side::Black),
            other => Err(Error::MalformedInput(format!(
                "unknown side '{}', expected 'white' or 'black'",
                other
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Piece type, independent of color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    /// Lowercase letter used by UCI promotion suffixes
    pub fn uci_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

impl From<Role> for PieceKind {
    fn from(role: Role) -> Self {
        match role {
            Role::Pawn => PieceKind::Pawn,
            Role::Knight => PieceKind::Knight,
            Role::Bishop => PieceKind::Bishop,
            Role::Rook => PieceKind::Rook,
            Role::Queen => PieceKind::Queen,
            Role::King => PieceKind::King,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastlingSide {
    Kingside,
    Queenside,
}

/// A single ply as it was played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMove {
    /// 1-based ply index
    pub ply: usize,
    /// Full move number as written in movetext
    pub move_number: usize,
    pub side: Side,
    /// Standard algebraic notation including the `+`/`#` suffix
    pub san: String,
    pub from: String,
    /// Destination square; for castling this is the king's destination
    pub to: String,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub castling: Option<CastlingSide>,
    /// Gives check without mating
    pub check: bool,
    pub checkmate: bool,
}

impl GameMove {
    /// Compact engine notation, e.g. `e2e4` or `e7e8q`
    pub fn uci(&self) -> String {
        let mut uci = format!("{}{}", self.from, self.to);
        if let Some(promo) = self.promotion {
            uci.push(promo.uci_char());
        }
        uci
    }

    /// Whether this move is the one an engine suggested.
    ///
    /// Accepts either SAN or the engine's compact from/to(/promotion) form.
    pub fn matches_engine_move(&self, engine_move: &str) -> bool {
        if engine_move.is_empty() {
            return false;
        }
        engine_move == self.san
            || engine_move == format!("{}{}", self.from, self.to)
            || engine_move == self.uci()
    }
}

/// Board state at one point of the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Number of plies played to reach this position (0 = start)
    pub ply: usize,
    pub fen: String,
    pub turn: Side,
    pub in_check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub draw: bool,
}

impl Position {
    pub(crate) fn from_chess(ply: usize, chess: &Chess) -> Self {
        let stalemate = chess.is_stalemate();
        Position {
            ply,
            fen: Fen::from_position(chess, EnPassantMode::Legal).to_string(),
            turn: chess.turn().into(),
            in_check: chess.is_check(),
            checkmate: chess.is_checkmate(),
            stalemate,
            draw: stalemate || chess.is_insufficient_material() || chess.halfmoves() >= 100,
        }
    }

    /// Rebuilds a playable board from the stored FEN
    pub fn to_chess(&self) -> Result<Chess> {
        parse_fen(&self.fen)
    }

    /// FEN fields that identify a repeated position (board, turn, castling, en passant)
    pub(crate) fn repetition_key(&self) -> &str {
        let mut end = self.fen.len();
        let mut spaces = 0;
        for (idx, ch) in self.fen.char_indices() {
            if ch == ' ' {
                spaces += 1;
                if spaces == 4 {
                    end = idx;
                    break;
                }
            }
        }
        &self.fen[..end]
    }
}

/// Parses a FEN string into a standard chess position
pub fn parse_fen(fen: &str) -> Result<Chess> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| Error::MalformedInput(format!("invalid FEN '{}': {}", fen, e)))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| Error::MalformedInput(format!("illegal position '{}': {}", fen, e)))
}
