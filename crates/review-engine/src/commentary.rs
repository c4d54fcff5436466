//! Natural-language commentary for an evaluated position.
//!
//! The language model is asked for a short explanation when a backend is
//! configured and the caller wants it. Everything else (terminal positions,
//! no backend, any backend failure) gets a deterministic template.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ReviewConfig;
use crate::llm::{CompletionBackend, CompletionRequest};
use crate::record::{EvaluationRecord, Source, TerminalKind};
use crate::score::{Score, Side};

const LLM_LINE_MOVES: usize = 4;
const LLM_SUGGESTIONS: usize = 2;

const CHECKMATE_TEXT: &str = "Checkmate position reached.";
const DRAW_TEXT: &str = "Game ended in a draw (stalemate, insufficient material, or repetition).";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentarySource {
    LanguageModel,
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentaryRecord {
    pub text: String,
    pub generated_by: CommentarySource,
}

impl CommentaryRecord {
    fn template(text: String) -> Self {
        Self {
            text,
            generated_by: CommentarySource::Template,
        }
    }
}

/// What the commentary is about besides the evaluation itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveContext<'a> {
    pub move_index: usize,
    /// The move played from this position, in SAN.
    pub played_san: Option<&'a str>,
    /// The same move in coordinate form, for the best-move comparison.
    pub played_uci: Option<&'a str>,
}

pub struct Commentator<B> {
    backend: Option<B>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl<B: CompletionBackend> Commentator<B> {
    pub fn new(backend: Option<B>, config: &ReviewConfig) -> Self {
        Self {
            backend,
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Commentary for `record`. `use_llm = false` forces the template.
    pub async fn comment(
        &self,
        record: &EvaluationRecord,
        ctx: MoveContext<'_>,
        use_llm: bool,
    ) -> CommentaryRecord {
        if record.source == Source::Terminal {
            return CommentaryRecord::template(terminal_text(record).to_string());
        }

        let backend = match &self.backend {
            Some(backend) if use_llm => backend,
            _ => return CommentaryRecord::template(template_text(record)),
        };

        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: build_prompt(record, ctx),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!(move_index = ctx.move_index, "Requesting commentary");

        match backend.complete(&request).await {
            Ok(text) => CommentaryRecord {
                text: tag_source(text.trim(), record.source),
                generated_by: CommentarySource::LanguageModel,
            },
            Err(e) => {
                warn!(move_index = ctx.move_index, error = %e, "Commentary backend failed, using template");
                CommentaryRecord::template(template_text(record))
            }
        }
    }
}

fn terminal_text(record: &EvaluationRecord) -> &'static str {
    match record.terminal_kind {
        Some(TerminalKind::Checkmate) => CHECKMATE_TEXT,
        _ => DRAW_TEXT,
    }
}

/// Five-band summary of the White-POV score, plus best move and source.
pub fn template_text(record: &EvaluationRecord) -> String {
    if record.source == Source::Terminal {
        return terminal_text(record).to_string();
    }

    let mut text = match record.score {
        Score::Unknown => {
            return "Position analysis unavailable. Engine unable to evaluate this position."
                .to_string()
        }
        Score::MateIn(mate) => {
            let winner = match mate.winner {
                Side::White => "White",
                Side::Black => "Black",
            };
            format!("Mate in {} moves for {}. The position has a forced checkmate sequence. ", mate.moves, winner)
        }
        Score::Centipawns(cp) => {
            let pawns = cp / 100.0;
            if pawns >= 2.0 {
                format!("White has a significant advantage ({pawns:+.1}). ")
            } else if pawns <= -2.0 {
                format!("Black has a significant advantage ({pawns:+.1}). ")
            } else if pawns > 0.5 {
                format!("White is slightly better ({pawns:+.1}). ")
            } else if pawns < -0.5 {
                format!("Black is slightly better ({pawns:+.1}). ")
            } else {
                format!("Position is roughly equal ({pawns:+.1}). ")
            }
        }
    };

    if let Some(best) = record.best_move_san().or(record.best_move_uci.as_deref()) {
        text.push_str(&format!("Best move: {best}. "));
    }

    text.push_str(match record.source {
        Source::Fallback => "(Basic analysis - cloud evaluation unavailable)",
        _ => "(Engine analysis - Lichess cloud evaluation)",
    });
    text
}

fn analysis_source(record: &EvaluationRecord) -> &'static str {
    match (record.source, record.variations.is_empty()) {
        (Source::Fallback, false) => "Basic position analysis",
        (Source::Fallback, true) => "Basic material/positional analysis",
        (_, false) => "Lichess engine analysis",
        (_, true) => "Limited analysis",
    }
}

fn variation_context(record: &EvaluationRecord) -> String {
    if record.variations.is_empty() {
        return match record.source {
            Source::Fallback => "Cloud evaluation unavailable - using basic analysis".to_string(),
            _ => "No engine lines available".to_string(),
        };
    }
    match record.source {
        Source::Fallback => {
            let suggestions: Vec<String> = record
                .variations
                .iter()
                .take(LLM_SUGGESTIONS)
                .map(|v| v.summary())
                .collect();
            format!("Suggested moves: {}", suggestions.join(", "))
        }
        _ => {
            let line: Vec<&str> = record.variations[0]
                .san
                .iter()
                .take(LLM_LINE_MOVES)
                .map(String::as_str)
                .collect();
            format!("Engine best line: {}", line.join(" "))
        }
    }
}

/// Single-turn prompt. Every part is bounded: one FEN, one move, at most
/// four moves of the top line or two suggestions.
pub fn build_prompt(record: &EvaluationRecord, ctx: MoveContext<'_>) -> String {
    let header = match record.source {
        Source::Fallback => "Chess position analysis using basic evaluation (at most 40 words):",
        _ => "Chess expert analysis with engine data (at most 40 words):",
    };
    let played_best = if record.played_best(ctx.played_uci) { "YES" } else { "NO" };

    format!(
        "{header}\n\n\
         Position: {fen}\n\
         Move {index}: {played}\n\
         Evaluation: {score}\n\
         Played best move: {played_best}\n\
         {context}\n\
         Source: {source}\n\n\
         Explain: what this evaluation means, the key factors, and better alternatives if any.",
        fen = record.fen,
        index = ctx.move_index,
        played = ctx.played_san.unwrap_or("Unknown"),
        score = record.formatted_score(),
        context = variation_context(record),
        source = analysis_source(record),
    )
}

/// Append "[Source: ...]" unless the model already named it.
fn tag_source(text: &str, source: Source) -> String {
    let marker = match source {
        Source::Fallback => "basic analysis",
        _ => "engine analysis",
    };
    if text.to_lowercase().contains(marker) {
        return text.to_string();
    }
    let label = match source {
        Source::Fallback => "Basic position analysis",
        _ => "Lichess engine analysis",
    };
    format!("{text} [Source: {label}]")
}
