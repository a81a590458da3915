//! PGN parsing functionality

use std::collections::BTreeMap;
use std::io::Cursor;
use std::ops::ControlFlow;

use pgn_reader::{RawTag, SanPlus, Skip, Visitor};
use serde::Serialize;
use shakmaty::Chess;

use super::summary::{game_over_reason, GameInfo, GameOverReason, GameStatistics};
use crate::error::{Error, Result};
use crate::game::{parse_fen, GameLine, GameMove, LineBuilder, Position};

/// A fully replayed game with everything derived from it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedGame {
    pub header: BTreeMap<String, String>,
    pub moves: Vec<GameMove>,
    pub positions: Vec<Position>,
    pub game_info: GameInfo,
    pub statistics: GameStatistics,
    pub result: String,
    pub is_game_over: bool,
    pub game_over_reason: Option<GameOverReason>,
}

impl ParsedGame {
    pub fn white(&self) -> &str {
        &self.game_info.players.white
    }

    pub fn black(&self) -> &str {
        &self.game_info.players.black
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn summary(&self) -> String {
        format!("{} vs {} - {}", self.white(), self.black(), self.result)
    }

    /// Moves and positions in the shape the orchestrator consumes
    pub fn line(&self) -> GameLine {
        GameLine {
            moves: self.moves.clone(),
            positions: self.positions.clone(),
        }
    }
}

/// A game as read from movetext, before any summary is derived
pub(crate) struct RawGame {
    pub header: BTreeMap<String, String>,
    pub line: GameLine,
    pub final_board: Chess,
}

struct GameMoves {
    header: BTreeMap<String, String>,
    builder: Option<LineBuilder>,
    error: Option<String>,
}

struct GameParser;

impl Visitor for GameParser {
    type Tags = BTreeMap<String, String>;
    type Movetext = GameMoves;
    type Output = Result<RawGame>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(BTreeMap::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let name = String::from_utf8_lossy(name).to_string();
        tags.insert(name, value.decode_utf8_lossy().to_string());
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let start = match tags.get("FEN") {
            Some(fen) => parse_fen(fen),
            None => Ok(Chess::default()),
        };
        let (builder, error) = match start {
            Ok(board) => (Some(LineBuilder::new(board)), None),
            Err(e) => (None, Some(e.to_string())),
        };
        ControlFlow::Continue(GameMoves {
            header: tags,
            builder,
            error,
        })
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        if movetext.error.is_some() {
            return ControlFlow::Continue(());
        }
        if let Some(builder) = movetext.builder.as_mut() {
            if let Err(e) = builder.play_san(&san.san) {
                movetext.error = Some(e.to_string());
            }
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        if let Some(error) = movetext.error {
            return Err(Error::Pgn(format!("Invalid move: {}", error)));
        }
        let builder = movetext
            .builder
            .ok_or_else(|| Error::Pgn("game has no starting position".to_string()))?;
        let final_board = builder.board().clone();
        Ok(RawGame {
            header: movetext.header,
            line: builder.finish(),
            final_board,
        })
    }
}

/// Reads the first game of a PGN text
pub(crate) fn read_first_game(pgn: &str) -> Result<RawGame> {
    let mut parser = GameParser;
    let mut reader = pgn_reader::Reader::new(Cursor::new(pgn.as_bytes()));

    match reader.read_game(&mut parser) {
        Ok(Some(game)) => game,
        Ok(None) => Err(Error::Pgn("No valid games found in PGN".to_string())),
        Err(e) => Err(Error::Pgn(e.to_string())),
    }
}

/// Parses a PGN game into moves, positions and derived metadata
pub fn parse_pgn(pgn: &str) -> Result<ParsedGame> {
    let validation = super::validate_pgn(pgn);
    if let Some(error) = validation.error {
        return Err(Error::Pgn(format!("Invalid PGN: {}", error)));
    }

    let raw = read_first_game(pgn)?;
    let game_info = GameInfo::from_game(&raw.header, &raw.line, &raw.final_board);
    let statistics = GameStatistics::from_moves(&raw.line.moves);
    let game_over_reason = game_over_reason(&raw.line, &raw.final_board);
    let result = raw
        .header
        .get("Result")
        .cloned()
        .unwrap_or_else(|| "*".to_string());

    Ok(ParsedGame {
        header: raw.header,
        moves: raw.line.moves,
        positions: raw.line.positions,
        game_info,
        statistics,
        result,
        is_game_over: game_over_reason.is_some(),
        game_over_reason,
    })
}
