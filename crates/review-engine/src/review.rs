//! Terminal rendering and command parsing for the interactive review.

use shakmaty::{Chess, File, Position, Rank, Square};

use chess_core::GameMetadata;

use crate::record::{EvaluationRecord, Variation};

pub const OPENING_NOTE: &str = "Opening theory, skipping detailed commentary.";
pub const OPENING_EVAL: &str = "skipped (opening/book)";
pub const PROMPT: &str = "Press Enter for next move, 's N' to skip, 'l N' to analyse variation N, 'q' to quit: ";
pub const LINE_PROMPT: &str = "   Press Enter for next move in variation, 'q' to quit variation: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewCommand {
    /// Enter: advance one ply.
    Next,
    /// `s N`: jump to ply N (1-based).
    SkipTo(usize),
    /// `l N`: walk variation N of the current position.
    Line(usize),
    Quit,
    /// `s` or `l` with something that is not a number.
    BadNumber,
    Unknown,
}

impl ReviewCommand {
    pub fn parse(input: &str) -> Self {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some(first) = parts.first() else {
            return ReviewCommand::Next;
        };
        let arg = parts.get(1).map(|s| s.parse::<usize>());

        match (first.to_lowercase().as_str(), arg) {
            ("q" | "quit" | "exit", _) => ReviewCommand::Quit,
            ("s" | "skip", Some(Ok(n))) => ReviewCommand::SkipTo(n),
            ("l" | "line" | "v" | "var", Some(Ok(n))) => ReviewCommand::Line(n),
            ("s" | "skip" | "l" | "line" | "v" | "var", Some(Err(_))) => ReviewCommand::BadNumber,
            _ => ReviewCommand::Unknown,
        }
    }
}

/// Header block printed before the first ply.
pub fn header(metadata: &GameMetadata) -> String {
    let mut out = String::from("=== Chess Game Review (Terminal) ===\n");
    let parts: Vec<&str> = [&metadata.event, &metadata.site, &metadata.date]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect();
    if !parts.is_empty() {
        out.push_str(&parts.join(" | "));
        out.push('\n');
    }
    out.push_str(&format!(
        "White: {}  vs  Black: {}   Result: {}\n",
        metadata.white_player.as_deref().unwrap_or("?"),
        metadata.black_player.as_deref().unwrap_or("?"),
        metadata.result.as_deref().unwrap_or("*"),
    ));
    out.push_str("------------------------------------\n");
    out
}

/// ASCII board, rank 8 first, `.` for empty squares.
pub fn render_board(pos: &Chess) -> String {
    let board = pos.board();
    let mut out = String::new();
    for rank in Rank::ALL.into_iter().rev() {
        let row: Vec<String> = File::ALL
            .into_iter()
            .map(|file| {
                board
                    .piece_at(Square::from_coords(file, rank))
                    .map(|p| p.char().to_string())
                    .unwrap_or_else(|| ".".to_string())
            })
            .collect();
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    out
}

/// Colour that played the 1-based ply.
pub fn ply_side(index: usize) -> &'static str {
    if index % 2 == 1 { "White" } else { "Black" }
}

/// `"  1. +0.20  e4  e5"`, with the SAN line capped at `max_plies`.
pub fn variation_row(number: usize, variation: &Variation, record: &EvaluationRecord, max_plies: usize) -> String {
    let shown: Vec<&str> = variation.san.iter().take(max_plies).map(String::as_str).collect();
    let seq = if shown.is_empty() {
        "(no moves)".to_string()
    } else {
        shown.join("  ")
    };
    format!(
        "{}. {}  {}",
        number,
        variation.score.display(record.color_to_move()),
        seq
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Source;
    use crate::score::{Score, Side};

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReviewCommand::parse(""), ReviewCommand::Next);
        assert_eq!(ReviewCommand::parse("   "), ReviewCommand::Next);
        assert_eq!(ReviewCommand::parse("q"), ReviewCommand::Quit);
        assert_eq!(ReviewCommand::parse("EXIT"), ReviewCommand::Quit);
        assert_eq!(ReviewCommand::parse("s 12"), ReviewCommand::SkipTo(12));
        assert_eq!(ReviewCommand::parse("skip 3"), ReviewCommand::SkipTo(3));
        assert_eq!(ReviewCommand::parse("l 2"), ReviewCommand::Line(2));
        assert_eq!(ReviewCommand::parse("var 1"), ReviewCommand::Line(1));
        assert_eq!(ReviewCommand::parse("s x"), ReviewCommand::BadNumber);
        assert_eq!(ReviewCommand::parse("s"), ReviewCommand::Unknown);
        assert_eq!(ReviewCommand::parse("hello"), ReviewCommand::Unknown);
    }

    #[test]
    fn test_header() {
        let metadata = GameMetadata {
            white_player: Some("Carlsen".into()),
            black_player: Some("Nakamura".into()),
            event: Some("Blitz".into()),
            date: Some("2024.01.01".into()),
            ..GameMetadata::default()
        };
        let text = header(&metadata);
        assert!(text.contains("Blitz | 2024.01.01\n"));
        assert!(text.contains("White: Carlsen  vs  Black: Nakamura   Result: *"));
    }

    #[test]
    fn test_render_start_board() {
        let board = render_board(&Chess::default());
        let lines: Vec<&str> = board.lines().collect();
        assert_eq!(lines[0], "r n b q k b n r");
        assert_eq!(lines[4], ". . . . . . . .");
        assert_eq!(lines[7], "R N B Q K B N R");
    }

    #[test]
    fn test_variation_row_black_to_move() {
        let record = EvaluationRecord {
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".into(),
            turn: Side::Black,
            score: Score::Centipawns(30.0),
            best_move_uci: None,
            variations: vec![],
            source: Source::Remote,
            terminal_kind: None,
            note: None,
        };
        let variation = Variation {
            moves: vec![],
            san: ["c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6"].iter().map(|s| s.to_string()).collect(),
            score: Score::Centipawns(30.0),
            label: None,
        };
        assert_eq!(
            variation_row(1, &variation, &record, 6),
            "1. -0.30  c5  Nf3  d6  d4  cxd4  Nxd4"
        );
    }
}
