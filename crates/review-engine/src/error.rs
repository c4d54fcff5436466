//! Review pipeline error types

use thiserror::Error;

/// Failure talking to the cloud evaluation endpoint. Every variant is
/// absorbed by the pipeline and downgraded to the fallback evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudEvalError {
    #[error("Position not in cloud database")]
    NotFound,

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Request timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Bad JSON: {0}")]
    Decode(String),
}

/// Failure calling or parsing the language-model backend. Never surfaced to
/// callers; commentary drops back to the template instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Request error: {0}")]
    Request(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Empty response")]
    EmptyResponse,
}

/// Errors returned to the caller of the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Invalid FEN: {0}")]
    InvalidPosition(String),

    #[error("Invalid PGN: {0}")]
    InvalidPgn(String),

    #[error("Invalid move index {index} (game has {total} moves)")]
    MoveIndexOutOfRange { index: i64, total: usize },
}

impl From<chess_core::PgnError> for AnalysisError {
    fn from(e: chess_core::PgnError) -> Self {
        match e {
            chess_core::PgnError::InvalidFen(fen) => AnalysisError::InvalidPosition(fen),
            other => AnalysisError::InvalidPgn(other.to_string()),
        }
    }
}
