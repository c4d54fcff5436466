//! Cloud evaluation and commentary pipeline for chess game review.

pub mod analyzer;
pub mod cache;
pub mod cloud_eval;
pub mod commentary;
pub mod config;
pub mod error;
pub mod fallback;
pub mod llm;
pub mod record;
pub mod review;
pub mod score;
pub mod terminal;
pub mod variation;

pub use analyzer::{Analyzer, EvalSettings, MoveAnalysis, PositionAnalysis, VariationStep};
pub use cloud_eval::{EvalSource, LichessCloudClient};
pub use commentary::{CommentaryRecord, CommentarySource, Commentator};
pub use config::ReviewConfig;
pub use error::{AnalysisError, CloudEvalError, LlmError};
pub use llm::{CompletionBackend, GroqClient};
pub use record::{EvaluationRecord, Source, TerminalKind, Variation};
pub use score::Score;
