use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::score::{Score, Side};

/// Where an evaluation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Remote,
    Fallback,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalKind {
    Checkmate,
    Stalemate,
    /// Insufficient material, 75-move rule or fivefold repetition.
    DrawOther,
}

/// One line from a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    /// Coordinate moves, as far as they could be replayed.
    pub moves: Vec<String>,
    /// SAN for the first `TOP_LEVEL_PLIES` moves.
    pub san: Vec<String>,
    /// White-POV score of the line; Unknown for heuristic suggestions.
    pub score: Score,
    /// Heuristic label ("tactical option", ...) for fallback suggestions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Variation {
    /// "e4  e5  Nf3", or "(no moves)".
    pub fn san_line(&self) -> String {
        if self.san.is_empty() {
            "(no moves)".to_string()
        } else {
            self.san.join("  ")
        }
    }

    /// Display text stored alongside analyses: the SAN line for engine
    /// lines, "Nf3 (tactical option)" for heuristic suggestions.
    pub fn summary(&self) -> String {
        match &self.label {
            Some(label) if self.san.is_empty() => label.clone(),
            Some(label) => format!("{} ({})", self.san.join(" "), label),
            None => self.san.join(" "),
        }
    }
}

/// The unit of result for a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub fen: String,
    /// Side to move, so the record renders without re-parsing the FEN.
    pub turn: Side,
    pub score: Score,
    pub best_move_uci: Option<String>,
    pub variations: Vec<Variation>,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_kind: Option<TerminalKind>,
    /// Extra marker, e.g. "No legal moves".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EvaluationRecord {
    pub fn color_to_move(&self) -> Color {
        match self.turn {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }

    /// Score relative to the side to move ("+0.20", "#-0", "N/A").
    pub fn formatted_score(&self) -> String {
        self.score.display(self.color_to_move())
    }

    pub fn top_variation(&self) -> Option<&Variation> {
        self.variations.first()
    }

    /// SAN of the best move when the top line has one.
    pub fn best_move_san(&self) -> Option<&str> {
        self.top_variation()
            .and_then(|v| v.san.first())
            .map(String::as_str)
    }

    /// Whether `played_uci` matches the record's best move (case-insensitive).
    /// False when either side is missing.
    pub fn played_best(&self, played_uci: Option<&str>) -> bool {
        match (played_uci, self.best_move_uci.as_deref()) {
            (Some(played), Some(best)) => played.eq_ignore_ascii_case(best),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(best: Option<&str>) -> EvaluationRecord {
        EvaluationRecord {
            fen: chess_core::notation::STANDARD_START_FEN.to_string(),
            turn: Side::White,
            score: Score::Centipawns(20.0),
            best_move_uci: best.map(str::to_string),
            variations: vec![],
            source: Source::Remote,
            terminal_kind: None,
            note: None,
        }
    }

    #[test]
    fn test_played_best_is_case_insensitive() {
        let r = record(Some("e2e4"));
        assert!(r.played_best(Some("E2E4")));
        assert!(!r.played_best(Some("d2d4")));
    }

    #[test]
    fn test_played_best_missing_data_is_false() {
        assert!(!record(None).played_best(Some("e2e4")));
        assert!(!record(Some("e2e4")).played_best(None));
    }

    #[test]
    fn test_variation_summary() {
        let v = Variation {
            moves: vec!["g1f3".into()],
            san: vec!["Nf3".into()],
            score: Score::Unknown,
            label: Some("tactical option".into()),
        };
        assert_eq!(v.summary(), "Nf3 (tactical option)");
        assert_eq!(v.san_line(), "Nf3");
    }
}
