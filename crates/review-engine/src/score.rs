//! Engine scores and their side-to-move display form.
//!
//! Scores are stored from White's point of view and only flipped when they
//! are rendered for the side to move:
//!
//! - centipawns: `+0.34`, `-1.00` (always signed, two decimals)
//! - mate: `#+3` when the side to move mates, `#-2` when it gets mated
//! - unknown: `N/A`
//!
//! A checkmated position renders as `#-0`: the side to move has been mated.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use shakmaty::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
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

/// Forced mate: `moves` until mate, delivered by `winner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mate {
    pub moves: u32,
    pub winner: Side,
}

/// Position score, White POV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Score {
    /// Centipawns (1/100 pawn).
    Centipawns(f64),
    MateIn(Mate),
    Unknown,
}

/// Score fields as they arrive from the remote engine (White POV).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScore {
    pub cp: Option<i32>,
    pub mate: Option<i32>,
}

impl RawScore {
    /// Read `cp` / `mate` from a PV object. Missing, null or non-numeric
    /// fields are treated as absent.
    pub fn from_json(pv: &JsonValue) -> Self {
        Self {
            cp: json_int(pv.get("cp")),
            mate: json_int(pv.get("mate")),
        }
    }
}

fn json_int(value: Option<&JsonValue>) -> Option<i32> {
    let value = value?;
    if let Some(i) = value.as_i64() {
        return i32::try_from(i).ok();
    }
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| f.round())
        .filter(|f| f.abs() <= i32::MAX as f64)
        .map(|f| f as i32)
}

impl Score {
    /// Convert a raw remote score. Mate takes precedence over centipawns.
    /// `turn` decides the winner of a zero-length mate (the side to move is
    /// the one mated).
    pub fn from_raw(raw: RawScore, turn: Color) -> Score {
        if let Some(mate) = raw.mate {
            let winner = match mate.signum() {
                1 => Side::White,
                -1 => Side::Black,
                _ => Side::from(turn).opposite(),
            };
            return Score::MateIn(Mate {
                moves: mate.unsigned_abs(),
                winner,
            });
        }
        match raw.cp {
            Some(cp) => Score::Centipawns(cp as f64),
            None => Score::Unknown,
        }
    }

    /// Heuristic score in pawns, kept to two decimals.
    pub fn from_pawns(pawns: f64) -> Score {
        Score::Centipawns((pawns * 100.0).round())
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Score::Unknown)
    }

    /// Render relative to the side to move.
    pub fn display(&self, turn: Color) -> String {
        match self {
            Score::MateIn(mate) => {
                let sign = if mate.winner == Side::from(turn) { '+' } else { '-' };
                format!("#{}{}", sign, mate.moves)
            }
            Score::Centipawns(cp) if cp.is_finite() => {
                let relative = match turn {
                    Color::White => *cp,
                    Color::Black => -*cp,
                };
                format_pawns(relative / 100.0)
            }
            _ => "N/A".to_string(),
        }
    }
}

/// Format a raw White-POV score for the side to move.
pub fn format_raw(raw: RawScore, black_to_move: bool) -> String {
    let turn = if black_to_move { Color::Black } else { Color::White };
    Score::from_raw(raw, turn).display(turn)
}

/// Signed pawns with two decimals. Values that round to zero print `+0.00`.
pub fn format_pawns(pawns: f64) -> String {
    let rounded = (pawns * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "+0.00".to_string()
    } else {
        format!("{:+.2}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cp(cp: i32) -> RawScore {
        RawScore { cp: Some(cp), mate: None }
    }

    fn mate(mate: i32) -> RawScore {
        RawScore { cp: None, mate: Some(mate) }
    }

    #[test]
    fn test_centipawns_flip_for_black() {
        assert_eq!(format_raw(cp(100), true), "-1.00");
        assert_eq!(format_raw(cp(-100), true), "+1.00");
    }

    #[test]
    fn test_centipawns_white_to_move() {
        assert_eq!(format_raw(cp(250), false), "+2.50");
        assert_eq!(format_raw(cp(-35), false), "-0.35");
        assert_eq!(format_raw(cp(0), true), "+0.00");
    }

    #[test]
    fn test_mate_display() {
        assert_eq!(format_raw(mate(3), false), "#+3");
        assert_eq!(format_raw(mate(-2), true), "#+2");
        assert_eq!(format_raw(mate(-2), false), "#-2");
        assert_eq!(format_raw(mate(4), true), "#-4");
    }

    #[test]
    fn test_mate_takes_precedence() {
        let raw = RawScore { cp: Some(500), mate: Some(1) };
        assert_eq!(format_raw(raw, false), "#+1");
    }

    #[test]
    fn test_zero_mate_is_side_to_move_mated() {
        assert_eq!(format_raw(mate(0), false), "#-0");
        assert_eq!(format_raw(mate(0), true), "#-0");
        let score = Score::from_raw(mate(0), Color::White);
        assert_eq!(score, Score::MateIn(Mate { moves: 0, winner: Side::Black }));
    }

    #[test]
    fn test_unknown_is_na() {
        assert_eq!(format_raw(RawScore::default(), false), "N/A");
        assert_eq!(Score::Centipawns(f64::NAN).display(Color::White), "N/A");
    }

    #[test]
    fn test_raw_from_json_tolerates_junk() {
        let raw = RawScore::from_json(&json!({"cp": "oops", "mate": null}));
        assert_eq!(raw, RawScore::default());
        let raw = RawScore::from_json(&json!({"cp": 31.6}));
        assert_eq!(raw.cp, Some(32));
    }

    #[test]
    fn test_from_pawns_rounds() {
        assert_eq!(Score::from_pawns(0.2), Score::Centipawns(20.0));
        assert_eq!(Score::from_pawns(-3.1).display(Color::White), "-3.10");
    }

    #[test]
    fn test_score_serializes_tagged() {
        let s = serde_json::to_value(Score::Centipawns(20.0)).unwrap();
        assert_eq!(s, json!({"kind": "centipawns", "value": 20.0}));
        let m = serde_json::to_value(Score::MateIn(Mate { moves: 2, winner: Side::Black })).unwrap();
        assert_eq!(m, json!({"kind": "mate_in", "value": {"moves": 2, "winner": "black"}}));
    }
}
