//! Game-over detection ahead of any remote lookup.

use shakmaty::{Chess, Position};

use chess_core::notation::{fen_of, normalize_fen};

use crate::record::{EvaluationRecord, Source, TerminalKind};
use crate::score::{Mate, Score, Side};

/// Halfmove clock at which the 75-move rule ends the game.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;
const FIVEFOLD: usize = 5;

/// Classify `pos` as game over, or None when play continues.
///
/// `history` holds the FENs of earlier positions in the same game (any
/// order, move counters ignored); it is only used for fivefold repetition
/// and may be empty when no game context exists.
pub fn classify(pos: &Chess, history: &[String]) -> Option<TerminalKind> {
    if pos.is_checkmate() {
        return Some(TerminalKind::Checkmate);
    }
    if pos.is_stalemate() {
        return Some(TerminalKind::Stalemate);
    }
    if pos.is_insufficient_material()
        || pos.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES
        || is_fivefold(pos, history)
    {
        return Some(TerminalKind::DrawOther);
    }
    None
}

fn is_fivefold(pos: &Chess, history: &[String]) -> bool {
    if history.len() + 1 < FIVEFOLD {
        return false;
    }
    let key = normalize_fen(&fen_of(pos));
    let earlier = history.iter().filter(|f| normalize_fen(f) == key).count();
    earlier + 1 >= FIVEFOLD
}

/// Record for a finished game. Checkmate is a zero-length mate won by the
/// side that just moved; every draw scores 0.00.
pub fn terminal_record(pos: &Chess, kind: TerminalKind) -> EvaluationRecord {
    let turn = Side::from(pos.turn());
    let score = match kind {
        TerminalKind::Checkmate => Score::MateIn(Mate {
            moves: 0,
            winner: turn.opposite(),
        }),
        TerminalKind::Stalemate | TerminalKind::DrawOther => Score::Centipawns(0.0),
    };

    EvaluationRecord {
        fen: fen_of(pos),
        turn,
        score,
        best_move_uci: None,
        variations: Vec::new(),
        source: Source::Terminal,
        terminal_kind: Some(kind),
        note: None,
    }
}

/// Classify and build the terminal record in one step.
pub fn check(pos: &Chess, history: &[String]) -> Option<EvaluationRecord> {
    classify(pos, history).map(|kind| terminal_record(pos, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::notation::parse_fen;

    const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

    #[test]
    fn test_fools_mate_is_checkmate() {
        let pos = parse_fen(FOOLS_MATE).unwrap();
        let record = check(&pos, &[]).unwrap();
        assert_eq!(record.terminal_kind, Some(TerminalKind::Checkmate));
        assert_eq!(record.source, Source::Terminal);
        assert!(record.variations.is_empty());
        assert_eq!(
            record.score,
            Score::MateIn(Mate { moves: 0, winner: Side::Black })
        );
        // White to move and mated: the side to move is lost.
        assert_eq!(record.formatted_score(), "#-0");
    }

    #[test]
    fn test_stalemate_scores_zero() {
        let pos = parse_fen(STALEMATE).unwrap();
        let record = check(&pos, &[]).unwrap();
        assert_eq!(record.terminal_kind, Some(TerminalKind::Stalemate));
        assert_eq!(record.score, Score::Centipawns(0.0));
        assert_eq!(record.formatted_score(), "+0.00");
    }

    #[test]
    fn test_insufficient_material_is_draw() {
        let pos = parse_fen("8/8/4k3/8/8/3K4/8/8 w - - 0 1").unwrap();
        assert_eq!(classify(&pos, &[]), Some(TerminalKind::DrawOther));
    }

    #[test]
    fn test_seventy_five_move_rule() {
        let pos = parse_fen("8/8/4k3/8/8/3K4/7R/8 w - - 150 120").unwrap();
        assert_eq!(classify(&pos, &[]), Some(TerminalKind::DrawOther));
        let pos = parse_fen("8/8/4k3/8/8/3K4/7R/8 w - - 149 120").unwrap();
        assert_eq!(classify(&pos, &[]), None);
    }

    #[test]
    fn test_fivefold_repetition_needs_history() {
        let fen = "8/8/4k3/8/8/3K4/7R/8 w - - 10 60";
        let pos = parse_fen(fen).unwrap();
        let four: Vec<String> = (0..4).map(|_| fen.to_string()).collect();
        assert_eq!(classify(&pos, &four), Some(TerminalKind::DrawOther));
        assert_eq!(classify(&pos, &four[..3]), None);
    }

    #[test]
    fn test_start_position_is_not_terminal() {
        assert!(check(&Chess::default(), &[]).is_none());
    }
}
