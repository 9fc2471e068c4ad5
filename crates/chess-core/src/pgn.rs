//! PGN replay: walks movetext through shakmaty so every ply gets an exact,
//! rules-correct FEN.

use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{fen::Fen, CastlingMode, Chess, EnPassantMode, Position as _};

use crate::error::RecordError;
use crate::game_data::{GameMetadata, GameRecord, PlyRecord, Position, Side};

/// Tags collected during header parsing.
#[derive(Default)]
struct GameTags {
    metadata: GameMetadata,
    fen: Option<String>,
}

/// State during movetext parsing.
struct ReplayState {
    board: Chess,
    start: Position,
    metadata: GameMetadata,
    plies: Vec<PlyRecord>,
}

/// Visitor that replays the first game of a PGN.
#[derive(Default)]
struct GameReplayer {
    record: Option<GameRecord>,
    error: Option<RecordError>,
}

fn board_fen(board: &Chess) -> String {
    Fen::from_position(board, EnPassantMode::Legal).to_string()
}

fn start_board(fen: &str) -> Result<Chess, RecordError> {
    let setup: Fen = fen
        .trim()
        .parse()
        .map_err(|e: shakmaty::fen::ParseFenError| RecordError::BadStartPosition(e.to_string()))?;
    setup
        .into_position(CastlingMode::Standard)
        .map_err(|_| RecordError::BadStartPosition(format!("illegal position: {fen}")))
}

impl Visitor for GameReplayer {
    type Tags = GameTags;
    type Movetext = ReplayState;
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<(), GameTags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(&mut self, tags: &mut GameTags, name: &[u8], value: RawTag<'_>) -> ControlFlow<()> {
        let value = value.decode_utf8_lossy().into_owned();
        match name {
            b"White" => tags.metadata.white = Some(value),
            b"Black" => tags.metadata.black = Some(value),
            b"Result" => tags.metadata.result = Some(value),
            b"Event" => tags.metadata.event = Some(value),
            b"Date" => tags.metadata.date = Some(value),
            b"FEN" => tags.fen = Some(value),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: GameTags) -> ControlFlow<(), ReplayState> {
        let board = match tags.fen.as_deref() {
            Some(fen) => match start_board(fen) {
                Ok(board) => board,
                Err(e) => {
                    self.error = Some(e);
                    return ControlFlow::Break(());
                }
            },
            None => Chess::default(),
        };

        ControlFlow::Continue(ReplayState {
            start: Position::new(board_fen(&board)),
            board,
            metadata: tags.metadata,
            plies: Vec::new(),
        })
    }

    fn san(&mut self, state: &mut ReplayState, san_plus: SanPlus) -> ControlFlow<()> {
        let index = state.plies.len();
        let notation = san_plus.to_string();

        let mv = match san_plus.san.to_move(&state.board) {
            Ok(mv) => mv,
            Err(e) => {
                self.error = Some(RecordError::IllegalMove {
                    ply: index,
                    san: notation,
                    reason: e.to_string(),
                });
                return ControlFlow::Break(());
            }
        };

        let side = Side::from(state.board.turn());
        let move_number = state.board.fullmoves().get();
        let uci = mv.to_uci(CastlingMode::Standard).to_string();

        state.board = match state.board.clone().play(mv) {
            Ok(board) => board,
            Err(_) => {
                self.error = Some(RecordError::IllegalMove {
                    ply: index,
                    san: notation,
                    reason: "move rejected by position".to_string(),
                });
                return ControlFlow::Break(());
            }
        };

        state.plies.push(PlyRecord {
            index,
            move_number,
            side,
            notation,
            uci,
            resulting_position: Position::new(board_fen(&state.board)),
        });

        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _state: &mut ReplayState) -> ControlFlow<(), Skip> {
        ControlFlow::Continue(Skip(true)) // mainline only
    }

    fn end_game(&mut self, state: ReplayState) {
        self.record = Some(GameRecord {
            metadata: state.metadata,
            start: state.start,
            plies: state.plies,
        });
    }
}

/// Parse the first game in `movetext` and replay it move by move.
///
/// Accepts bare movetext (`1. e4 e5`) or a full PGN with tag pairs. A `FEN`
/// tag sets the starting position. Comments, NAGs and variations are ignored.
pub fn parse_game(movetext: &str) -> Result<GameRecord, RecordError> {
    let mut replayer = GameReplayer::default();
    let mut reader = Reader::new(movetext.as_bytes());

    let found = reader
        .read_game(&mut replayer)
        .map_err(|e| RecordError::Unreadable(e.to_string()))?;

    if let Some(err) = replayer.error.take() {
        return Err(err);
    }

    let record = match (found, replayer.record) {
        (Some(()), Some(record)) => record,
        _ => return Err(RecordError::NoMoves),
    };

    if record.plies.is_empty() {
        return Err(RecordError::NoMoves);
    }

    Ok(record)
}

/// Replay every game in a PGN collection. A game that fails to replay yields
/// its error and reading continues with the next one.
pub fn parse_games(pgn: &str) -> Result<Vec<Result<GameRecord, RecordError>>, RecordError> {
    let mut reader = Reader::new(pgn.as_bytes());
    let mut games = Vec::new();

    loop {
        let mut replayer = GameReplayer::default();
        let found = reader
            .read_game(&mut replayer)
            .map_err(|e| RecordError::Unreadable(e.to_string()))?;
        if found.is_none() {
            break;
        }

        games.push(match (replayer.error.take(), replayer.record) {
            (Some(err), _) => Err(err),
            (None, Some(record)) if !record.plies.is_empty() => Ok(record),
            _ => Err(RecordError::NoMoves),
        });
    }

    Ok(games)
}
