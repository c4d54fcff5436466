//! Local heuristic evaluation used when the cloud has nothing for us.
//!
//! Material plus a couple of positional nudges, and three move suggestions
//! picked from the first legal moves by capture/check/centre priority.

use shakmaty::{Chess, Color, Move, Position, Role, Square};

use chess_core::notation::{fen_of, san_of, uci_of};

use crate::record::{EvaluationRecord, Source, Variation};
use crate::score::{Score, Side};

const CENTER: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];
const CENTER_BONUS: f64 = 0.1;
const KING_ATTACKED_PENALTY: f64 = 0.2;
const MOVE_SCAN_LIMIT: usize = 20;
const SUGGESTION_LABELS: [&str; 3] = ["capture/check priority", "tactical option", "alternative"];

pub const NO_LEGAL_MOVES: &str = "No legal moves";
pub const BASIC_NOTE: &str = "Basic evaluation (cloud evaluation unavailable)";

fn piece_value(role: Role) -> f64 {
    match role {
        Role::Pawn => 1.0,
        Role::Knight | Role::Bishop => 3.0,
        Role::Rook => 5.0,
        Role::Queen => 9.0,
        Role::King => 0.0,
    }
}

/// White material minus Black material, in pawns.
pub fn material_balance(pos: &Chess) -> f64 {
    let board = pos.board();
    board
        .occupied()
        .into_iter()
        .filter_map(|sq| board.piece_at(sq))
        .map(|piece| match piece.color {
            Color::White => piece_value(piece.role),
            Color::Black => -piece_value(piece.role),
        })
        .sum()
}

/// Centre occupation and king-under-attack adjustments, White POV.
pub fn positional_adjustment(pos: &Chess) -> f64 {
    let board = pos.board();
    let mut score = 0.0;

    for sq in CENTER {
        match board.piece_at(sq).map(|p| p.color) {
            Some(Color::White) => score += CENTER_BONUS,
            Some(Color::Black) => score -= CENTER_BONUS,
            None => {}
        }
    }

    if king_attacked(pos, Color::White) {
        score -= KING_ATTACKED_PENALTY;
    }
    if king_attacked(pos, Color::Black) {
        score += KING_ATTACKED_PENALTY;
    }

    score
}

fn king_attacked(pos: &Chess, color: Color) -> bool {
    let board = pos.board();
    match board.king_of(color) {
        Some(king) => board.attacks_to(king, !color, board.occupied()).any(),
        None => false,
    }
}

fn move_priority(pos: &Chess, mv: &Move) -> u8 {
    if mv.is_capture() {
        return 3;
    }
    let mut after = pos.clone();
    after.play_unchecked(*mv);
    if after.is_check() {
        2
    } else if CENTER.contains(&mv.to()) {
        1
    } else {
        0
    }
}

/// Up to three labelled single-move suggestions, best priority first.
/// Ties keep move-generation order.
pub fn suggest_moves(pos: &Chess) -> Vec<Variation> {
    let mut scored: Vec<(Move, u8)> = pos
        .legal_moves()
        .into_iter()
        .take(MOVE_SCAN_LIMIT)
        .map(|mv| {
            let priority = move_priority(pos, &mv);
            (mv, priority)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored
        .into_iter()
        .zip(SUGGESTION_LABELS)
        .map(|((mv, _), label)| Variation {
            moves: vec![uci_of(&mv)],
            san: vec![san_of(pos, &mv)],
            score: Score::Unknown,
            label: Some(label.to_string()),
        })
        .collect()
}

/// Heuristic evaluation of a legal position.
pub fn evaluate(pos: &Chess) -> EvaluationRecord {
    let total = material_balance(pos) + positional_adjustment(pos);
    let mut suggestions = suggest_moves(pos);

    let note = if suggestions.is_empty() {
        suggestions.push(Variation {
            moves: Vec::new(),
            san: Vec::new(),
            score: Score::Unknown,
            label: Some(NO_LEGAL_MOVES.to_string()),
        });
        NO_LEGAL_MOVES
    } else {
        BASIC_NOTE
    };

    EvaluationRecord {
        fen: fen_of(pos),
        turn: Side::from(pos.turn()),
        score: Score::from_pawns(total),
        best_move_uci: suggestions.first().and_then(|v| v.moves.first().cloned()),
        variations: suggestions,
        source: Source::Fallback,
        terminal_kind: None,
        note: Some(note.to_string()),
    }
}
