//! Principal-variation decoding.
//!
//! Cloud PV entries come in a few shapes: a space-separated string under
//! `moves`, a list of tokens or token objects under `moves`, or a string
//! under `pv`. A present `moves` key shadows `pv` even when it holds
//! neither shape; anything else yields no moves.

use serde_json::Value as JsonValue;
use shakmaty::{Chess, Position};

use chess_core::notation::{parse_move, san_of};

/// Plies shown per variation in a game review.
pub const TOP_LEVEL_PLIES: usize = 8;
/// Plies shown for each line nested inside a variation walk.
pub const NESTED_PLIES: usize = 6;
/// Plies walked when drilling into a variation interactively.
pub const DRILL_DOWN_PLIES: usize = 16;

/// Object keys that may carry the move inside a list entry, in priority order.
const MOVE_KEYS: [&str; 3] = ["uci", "move", "fromTo"];

/// Shortest token that can encode a coordinate move.
const MIN_TOKEN_LEN: usize = 4;

enum PvShape<'a> {
    MoveString(&'a str),
    MoveList(&'a [JsonValue]),
    PvString(&'a str),
    Empty,
}

impl<'a> PvShape<'a> {
    fn detect(pv: &'a JsonValue) -> Self {
        match (pv.get("moves"), pv.get("pv")) {
            (Some(JsonValue::String(s)), _) => PvShape::MoveString(s),
            (Some(JsonValue::Array(items)), _) => PvShape::MoveList(items),
            (Some(_), _) => PvShape::Empty,
            (None, Some(JsonValue::String(s))) => PvShape::PvString(s),
            (None, _) => PvShape::Empty,
        }
    }

    fn tokens(self) -> Vec<String> {
        match self {
            PvShape::MoveString(s) | PvShape::PvString(s) => {
                s.split_whitespace().map(str::to_string).collect()
            }
            PvShape::MoveList(items) => items.iter().filter_map(list_entry_token).collect(),
            PvShape::Empty => Vec::new(),
        }
    }
}

fn list_entry_token(item: &JsonValue) -> Option<String> {
    match item {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Object(obj) => MOVE_KEYS
            .iter()
            .filter_map(|key| obj.get(*key).and_then(|v| v.as_str()))
            .find(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Flat list of move tokens from a PV entry. Tokens shorter than four
/// characters are dropped; nothing here checks legality.
pub fn extract_moves(pv: &JsonValue) -> Vec<String> {
    PvShape::detect(pv)
        .tokens()
        .into_iter()
        .filter(|m| m.chars().count() >= MIN_TOKEN_LEN)
        .collect()
}

/// A replayed line: the coordinate moves that decoded and their SAN.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedLine {
    pub uci: Vec<String>,
    pub san: Vec<String>,
}

/// Replay `tokens` from `start`, up to `max_moves`. Each token is read as a
/// coordinate move, then as SAN; the first one that is neither stops the
/// replay and the moves decoded so far are returned.
pub fn decode_line(start: &Chess, tokens: &[String], max_moves: usize) -> DecodedLine {
    let mut pos = start.clone();
    let mut line = DecodedLine::default();

    for token in tokens.iter().take(max_moves) {
        let Some(mv) = parse_move(&pos, token) else {
            break;
        };
        if !pos.is_legal(mv) {
            break;
        }
        line.san.push(san_of(&pos, &mv));
        line.uci.push(chess_core::notation::uci_of(&mv));
        pos.play_unchecked(mv);
    }

    line
}

/// SAN list for `tokens` from `start`; see [`decode_line`].
pub fn to_san_list(start: &Chess, tokens: &[String], max_moves: usize) -> Vec<String> {
    decode_line(start, tokens, max_moves).san
}
