//! Lightweight regex-based PGN parsing, replay and annotated export.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use shakmaty::{Chess, Position};

use crate::error::PgnError;
use crate::game_data::{GameData, GameMetadata, Ply};
use crate::notation::{fen_of, parse_fen, parse_san, san_of, uci_of, STANDARD_START_FEN};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header pattern"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("tag pattern"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").expect("comment pattern"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("variation pattern"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?")
        .expect("move pattern")
});

/// Parse a PGN string into a GameData struct.
/// Returns None when no mainline moves can be found.
pub fn parse_pgn(pgn: &str) -> Option<GameData> {
    let cleaned = clean_pgn_content(pgn);

    let mut metadata = GameMetadata::default();
    let mut start_fen = None;
    for cap in HEADER_RE.captures_iter(&cleaned) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => metadata.white_player = Some(value),
            "Black" => metadata.black_player = Some(value),
            "Result" => metadata.result = Some(value),
            "Date" => metadata.date = Some(value),
            "Event" => metadata.event = Some(value),
            "Site" => metadata.site = Some(value),
            "Round" => metadata.round = Some(value),
            "ECO" => metadata.eco = Some(value),
            "FEN" if !value.trim().is_empty() => start_fen = Some(value.trim().to_string()),
            _ => {}
        }
    }

    let moves = extract_moves(&cleaned);
    if moves.is_empty() {
        return None;
    }

    Some(GameData {
        metadata,
        moves,
        pgn: cleaned,
        start_fen,
    })
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = TAG_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, " ");

    // Strip innermost variations until none remain, so nested lines go too.
    let mut text = no_comments.into_owned();
    while VARIATION_RE.is_match(&text) {
        text = VARIATION_RE.replace_all(&text, " ").into_owned();
    }

    MOVE_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Normalise pasted PGN: split headers glued onto one line, drop blank
/// lines, and make sure a blank line separates headers from movetext.
pub fn clean_pgn_content(pgn: &str) -> String {
    let split = pgn.replace("] [", "]\n[");
    let mut out = String::with_capacity(split.len());
    let mut in_headers = false;

    for line in split.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let is_header = line.starts_with('[');
        if in_headers && !is_header {
            out.push('\n');
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        in_headers = is_header;
    }

    out
}

/// Replay SAN moves from `start_fen` (the standard start when None),
/// recording SAN, UCI and the FEN on either side of every ply.
pub fn replay_mainline(start_fen: Option<&str>, moves: &[String]) -> Result<Vec<Ply>, PgnError> {
    let mut pos = match start_fen {
        Some(fen) => parse_fen(fen)?,
        None => Chess::default(),
    };
    let mut plies = Vec::with_capacity(moves.len());

    for (i, token) in moves.iter().enumerate() {
        let mv = parse_san(&pos, token).ok_or_else(|| PgnError::IllegalMove {
            ply: i + 1,
            san: token.clone(),
        })?;

        let fen_before = fen_of(&pos);
        let san = san_of(&pos, &mv);
        let uci = uci_of(&mv);
        pos.play_unchecked(mv);

        plies.push(Ply {
            index: i + 1,
            san,
            uci,
            fen_before,
            fen_after: fen_of(&pos),
        });
    }

    Ok(plies)
}

/// Render the game back to PGN with `{comment}` annotations after the plies
/// listed in `comments` (keyed by 1-based ply number).
pub fn export_annotated(
    metadata: &GameMetadata,
    plies: &[Ply],
    comments: &HashMap<usize, String>,
) -> String {
    let result = metadata.result.as_deref().unwrap_or("*");
    let tags = [
        ("Event", metadata.event.as_deref()),
        ("Site", metadata.site.as_deref()),
        ("Date", metadata.date.as_deref()),
        ("Round", metadata.round.as_deref()),
        ("White", metadata.white_player.as_deref()),
        ("Black", metadata.black_player.as_deref()),
        ("Result", Some(result)),
    ];

    let mut out = String::new();
    for (name, value) in tags {
        out.push_str(&format!("[{} \"{}\"]\n", name, value.unwrap_or("?")));
    }
    if let Some(eco) = &metadata.eco {
        out.push_str(&format!("[ECO \"{}\"]\n", eco));
    }
    if let Some(first) = plies.first().filter(|p| p.fen_before != STANDARD_START_FEN) {
        out.push_str(&format!("[SetUp \"1\"]\n[FEN \"{}\"]\n", first.fen_before));
    }
    out.push('\n');

    let mut tokens: Vec<String> = Vec::new();
    // Black's first move needs its number too.
    let mut needs_number = true;
    for ply in plies {
        let (white_to_move, move_num) = turn_and_number(&ply.fen_before);
        if white_to_move {
            tokens.push(format!("{}.", move_num));
        } else if needs_number {
            tokens.push(format!("{}...", move_num));
        }
        tokens.push(ply.san.clone());

        needs_number = match comments.get(&ply.index) {
            Some(text) if !text.is_empty() => {
                tokens.push(format!("{{{}}}", text.replace('}', ")")));
                true
            }
            _ => false,
        };
    }
    tokens.push(result.to_string());

    // Wrap movetext at 80 columns.
    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() > 80 {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        line_len += token.len();
        out.push_str(&token);
    }
    out.push('\n');

    out
}

/// Side to move and fullmove number from a FEN's last fields.
fn turn_and_number(fen: &str) -> (bool, u32) {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let white_to_move = fields.get(1) != Some(&"b");
    let number = fields.get(5).and_then(|n| n.parse().ok()).unwrap_or(1);
    (white_to_move, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pgn_basic() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]
[Date "2025.01.15"]

1. e4 e5 2. Nf3 Nc6 1-0"#;

        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.metadata.white_player.as_deref(), Some("Player1"));
        assert_eq!(game.metadata.black_player.as_deref(), Some("Player2"));
        assert_eq!(game.metadata.result.as_deref(), Some("1-0"));
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn test_parse_pgn_skips_comments_and_variations() {
        let pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3 (2. c3)) 2. Nf3 $1 *";
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_parse_pgn_without_moves() {
        assert!(parse_pgn("[White \"A\"]\n[Black \"B\"]").is_none());
    }

    #[test]
    fn test_clean_pgn_content_splits_glued_headers() {
        let cleaned = clean_pgn_content("[White \"A\"] [Black \"B\"]\n1. e4 e5 *");
        assert_eq!(cleaned, "[White \"A\"]\n[Black \"B\"]\n\n1. e4 e5 *");
    }

    #[test]
    fn test_replay_mainline_records_both_notations() {
        let moves: Vec<String> = ["e4", "e5", "Nf3"].iter().map(|s| s.to_string()).collect();
        let plies = replay_mainline(None, &moves).unwrap();
        assert_eq!(plies.len(), 3);
        assert_eq!(plies[2].uci, "g1f3");
        assert_eq!(plies[2].san, "Nf3");
        assert_eq!(plies[0].fen_before, crate::notation::STANDARD_START_FEN);
        assert_eq!(plies[1].fen_after, plies[2].fen_before);
    }

    #[test]
    fn test_replay_mainline_reports_illegal_ply() {
        let moves: Vec<String> = ["e4", "e4"].iter().map(|s| s.to_string()).collect();
        let err = replay_mainline(None, &moves).unwrap_err();
        assert_eq!(err, PgnError::IllegalMove { ply: 2, san: "e4".into() });
    }

    #[test]
    fn test_export_annotated_inserts_comments() {
        let moves: Vec<String> = ["e4", "e5", "Nf3"].iter().map(|s| s.to_string()).collect();
        let plies = replay_mainline(None, &moves).unwrap();
        let mut comments = HashMap::new();
        comments.insert(1, "[Eval: +0.20] Solid".to_string());

        let metadata = GameMetadata {
            white_player: Some("A".into()),
            black_player: Some("B".into()),
            result: Some("*".into()),
            ..Default::default()
        };
        let pgn = export_annotated(&metadata, &plies, &comments);
        assert!(pgn.contains("[White \"A\"]"));
        assert!(pgn.contains("1. e4 {[Eval: +0.20] Solid} 1... e5 2. Nf3 *"));
    }

    const SETUP_PGN: &str = "[White \"A\"]\n[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n\n1. e4 Kd7 2. e5 *";

    #[test]
    fn test_parse_pgn_reads_setup_fen() {
        let game = parse_pgn(SETUP_PGN).unwrap();
        assert_eq!(game.start_fen.as_deref(), Some("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"));
        assert!(parse_pgn("1. e4 e5 *").unwrap().start_fen.is_none());
    }

    #[test]
    fn test_replay_mainline_from_setup_position() {
        let game = parse_pgn(SETUP_PGN).unwrap();
        let plies = replay_mainline(game.start_fen.as_deref(), &game.moves).unwrap();
        assert_eq!(plies.len(), 3);
        assert_eq!(plies[0].fen_before, "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        assert_eq!(plies[1].uci, "e8d7");
        assert_eq!(plies[2].san, "e5");
    }

    #[test]
    fn test_replay_mainline_rejects_bad_setup_fen() {
        let moves = vec!["e4".to_string()];
        assert!(matches!(
            replay_mainline(Some("not a fen"), &moves),
            Err(PgnError::InvalidFen(_))
        ));
    }

    #[test]
    fn test_export_annotated_keeps_setup_position() {
        // Black to move first, from move 12.
        let moves: Vec<String> = ["Kd7", "e5"].iter().map(|s| s.to_string()).collect();
        let fen = "4k3/8/8/8/4P3/8/8/4K3 b - - 0 12";
        let plies = replay_mainline(Some(fen), &moves).unwrap();

        let pgn = export_annotated(&GameMetadata::default(), &plies, &HashMap::new());
        assert!(pgn.contains("[SetUp \"1\"]\n[FEN \"4k3/8/8/8/4P3/8/8/4K3 b - - 0 12\"]"));
        assert!(pgn.contains("12... Kd7 13. e5 *"));
    }
}
