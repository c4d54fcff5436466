//! Board capability helpers on top of shakmaty: FEN encode/decode and
//! move conversion between coordinate and algebraic notation.

use shakmaty::{
    fen::Fen, san::San, san::SanPlus, uci::UciMove, CastlingMode, Chess, EnPassantMode, Move,
    Position,
};

use crate::error::PgnError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Load a position from a FEN string.
pub fn parse_fen(fen: &str) -> Result<Chess, PgnError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|_| PgnError::InvalidFen(fen.to_string()))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|_| PgnError::InvalidFen(fen.to_string()))
}

/// Encode a position as FEN.
pub fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Coordinate notation for a move, e.g. "e2e4" or "e7e8q".
pub fn uci_of(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

/// SAN for a move in `pos`, with "+" or "#" appended like a PGN writer would.
/// The SAN body is computed on the pre-move position.
pub fn san_of(pos: &Chess, mv: &Move) -> String {
    let mut san = San::from_move(pos, *mv).to_string();
    let mut after = pos.clone();
    after.play_unchecked(*mv);
    if after.is_checkmate() {
        san.push('#');
    } else if after.is_check() {
        san.push('+');
    }
    san
}

/// Decode a coordinate move token against `pos`. Only legal moves decode.
pub fn parse_uci(pos: &Chess, token: &str) -> Option<Move> {
    let uci: UciMove = token.parse().ok()?;
    uci.to_move(pos).ok()
}

/// Parse already-notated algebraic text ("Nf3", "exd5+", "O-O") against `pos`.
pub fn parse_san(pos: &Chess, token: &str) -> Option<Move> {
    let san: SanPlus = token.parse().ok()?;
    san.san.to_move(pos).ok()
}

/// Coordinate form first, then algebraic.
pub fn parse_move(pos: &Chess, token: &str) -> Option<Move> {
    parse_uci(pos, token).or_else(|| parse_san(pos, token))
}
