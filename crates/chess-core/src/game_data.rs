use serde::{Deserialize, Serialize};

/// Seven-tag-roster style metadata pulled from PGN headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white_player: Option<String>,
    pub black_player: Option<String>,
    pub event: Option<String>,
    pub result: Option<String>, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub site: Option<String>,
    pub round: Option<String>,
    pub eco: Option<String>,
}

impl GameMetadata {
    /// "White vs Black" title, falling back to the colour names.
    pub fn title(&self) -> String {
        format!(
            "{} vs {}",
            self.white_player.as_deref().unwrap_or("White"),
            self.black_player.as_deref().unwrap_or("Black")
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation
    pub pgn: String,
    /// `[FEN]` header of a game set up from a custom position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_fen: Option<String>,
}

/// One half-move of a replayed mainline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ply {
    /// 1-based ply number.
    pub index: usize,
    pub san: String,
    pub uci: String,
    pub fen_before: String,
    pub fen_after: String,
}
