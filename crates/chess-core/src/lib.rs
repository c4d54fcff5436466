pub mod error;
pub mod game_data;
pub mod notation;
pub mod pgn;

pub use error::PgnError;
pub use game_data::{GameData, GameMetadata, Ply};
