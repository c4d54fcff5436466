//! Position evaluation and commentary pipeline.
//!
//! For every position: terminal check, then the evaluation cache, then the
//! cloud source, then the local fallback. Remote failures never reach the
//! caller; only malformed input (FEN, PGN, move index) does.

use serde::Serialize;
use shakmaty::{Chess, Position};
use tracing::{debug, info, warn};

use chess_core::notation::{fen_of, parse_fen, parse_move, san_of, uci_of};
use chess_core::pgn::{parse_pgn, replay_mainline};
use chess_core::Ply;

use crate::cache::{CacheKey, EvalCache};
use crate::cloud_eval::{parse_cloud_eval, EvalSource};
use crate::commentary::{CommentaryRecord, Commentator, MoveContext};
use crate::config::ReviewConfig;
use crate::error::{AnalysisError, CloudEvalError};
use crate::fallback;
use crate::llm::CompletionBackend;
use crate::record::{EvaluationRecord, Source, Variation};
use crate::terminal;

/// Moves walked by [`Analyzer::explore_variation`].
pub const MAX_VARIATION_MOVES: usize = 10;
/// Plies covered by [`Analyzer::analyze_range`].
pub const RANGE_PLIES: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct EvalSettings {
    pub multi_pv: u32,
    pub depth: u32,
    /// Cache the fallback result when the cloud does not know a position.
    pub cache_not_found: bool,
}

impl From<&ReviewConfig> for EvalSettings {
    fn from(config: &ReviewConfig) -> Self {
        Self {
            multi_pv: config.multi_pv,
            depth: config.search_depth,
            cache_not_found: config.cache_not_found,
        }
    }
}

/// Single-position analysis: the position before `move_index`'s move.
#[derive(Debug, Clone, Serialize)]
pub struct MoveAnalysis {
    pub move_index: usize,
    pub fen: String,
    pub evaluation: String,
    pub explanation: CommentaryRecord,
    pub variations: Vec<String>,
    pub played_best: bool,
    pub source: Source,
    pub record: EvaluationRecord,
}

/// Analysis of the position reached after a game ply.
#[derive(Debug, Clone, Serialize)]
pub struct PositionAnalysis {
    pub move_number: usize,
    pub position_fen: String,
    pub move_san: String,
    pub evaluation: String,
    pub best_move: Option<String>,
    pub variations: Vec<String>,
    pub explanation: Option<CommentaryRecord>,
    pub record: EvaluationRecord,
}

/// One move of an explored line and the position it leads to.
#[derive(Debug, Clone, Serialize)]
pub struct VariationStep {
    pub move_number: usize,
    pub san: String,
    pub fen: String,
    pub evaluation: String,
    pub explanation: CommentaryRecord,
    pub best_move: Option<String>,
    pub variations: Vec<String>,
}

fn variation_summaries(record: &EvaluationRecord) -> Vec<String> {
    record.variations.iter().map(Variation::summary).collect()
}

pub struct Analyzer<E, B> {
    source: Option<E>,
    cache: EvalCache,
    commentator: Commentator<B>,
    settings: EvalSettings,
}

impl<E: EvalSource, B: CompletionBackend> Analyzer<E, B> {
    pub fn new(source: Option<E>, commentator: Commentator<B>, settings: EvalSettings) -> Self {
        Self {
            source,
            cache: EvalCache::new(),
            commentator,
            settings,
        }
    }

    pub fn cache(&self) -> &EvalCache {
        &self.cache
    }

    pub fn settings(&self) -> EvalSettings {
        self.settings
    }

    pub fn commentator(&self) -> &Commentator<B> {
        &self.commentator
    }

    /// Evaluate a FEN. A malformed FEN is the only error.
    pub async fn evaluate_fen(&self, fen: &str) -> Result<EvaluationRecord, AnalysisError> {
        let pos = parse_fen(fen)?;
        Ok(self.evaluate_position(&pos, &[]).await)
    }

    /// Evaluate a legal position. `history` holds earlier FENs of the same
    /// game for repetition detection.
    pub async fn evaluate_position(&self, pos: &Chess, history: &[String]) -> EvaluationRecord {
        if let Some(record) = terminal::check(pos, history) {
            debug!(fen = %record.fen, kind = ?record.terminal_kind, "Terminal position");
            return record;
        }

        let fen = fen_of(pos);
        let key = CacheKey::new(&fen, self.settings.multi_pv, self.settings.depth);
        if let Some(hit) = self.cache.get(&key) {
            debug!(fen = %fen, "Evaluation cache hit");
            return hit;
        }

        let Some(source) = &self.source else {
            return fallback::evaluate(pos);
        };

        let fetched = source
            .fetch(&fen, self.settings.multi_pv, self.settings.depth)
            .await
            .and_then(|body| parse_cloud_eval(&body, pos, self.settings.multi_pv));

        match fetched {
            Ok(record) => {
                debug!(fen = %fen, lines = record.variations.len(), "Cloud evaluation");
                self.cache.insert(key, record.clone());
                record
            }
            Err(CloudEvalError::NotFound) => {
                info!(fen = %fen, "Position not in cloud database, using fallback");
                let record = fallback::evaluate(pos);
                if self.settings.cache_not_found {
                    self.cache.insert(key, record.clone());
                }
                record
            }
            Err(e) => {
                warn!(fen = %fen, error = %e, "Cloud evaluation failed, using fallback");
                fallback::evaluate(pos)
            }
        }
    }

    /// Evaluate `fen` and comment on the move `played` (SAN or UCI) from it.
    /// An unreadable `played` move is treated as absent.
    pub async fn analyze_move(
        &self,
        fen: &str,
        move_index: usize,
        played: Option<&str>,
    ) -> Result<MoveAnalysis, AnalysisError> {
        let pos = parse_fen(fen)?;
        let record = self.evaluate_position(&pos, &[]).await;

        let played_move = played.and_then(|token| parse_move(&pos, token));
        let played_san = played_move.as_ref().map(|mv| san_of(&pos, mv));
        let played_uci = played_move.as_ref().map(uci_of);

        let ctx = MoveContext {
            move_index,
            played_san: played_san.as_deref(),
            played_uci: played_uci.as_deref(),
        };
        let explanation = self.commentator.comment(&record, ctx, true).await;

        Ok(MoveAnalysis {
            move_index,
            fen: record.fen.clone(),
            evaluation: record.formatted_score(),
            explanation,
            variations: variation_summaries(&record),
            played_best: record.played_best(played_uci.as_deref()),
            source: record.source,
            record,
        })
    }

    /// Analyse the position after every ply of the game.
    pub async fn analyze_game(
        &self,
        pgn: &str,
        use_llm: bool,
    ) -> Result<Vec<PositionAnalysis>, AnalysisError> {
        let plies = mainline(pgn)?;
        info!(plies = plies.len(), use_llm, "Analysing game");
        self.analyze_plies(&plies, 1..plies.len() + 1, use_llm).await
    }

    /// Analyse only plies `start_move .. start_move + 3` (1-based). A start
    /// past the last ply is out of range.
    pub async fn analyze_range(
        &self,
        pgn: &str,
        start_move: usize,
        use_llm: bool,
    ) -> Result<Vec<PositionAnalysis>, AnalysisError> {
        let plies = mainline(pgn)?;
        if start_move > plies.len() {
            return Err(AnalysisError::MoveIndexOutOfRange {
                index: i64::try_from(start_move).unwrap_or(i64::MAX),
                total: plies.len(),
            });
        }
        let first = start_move.max(1);
        let end = (plies.len() + 1).min(start_move.saturating_add(RANGE_PLIES));
        info!(first, end, use_llm, "Analysing game range");
        self.analyze_plies(&plies, first..end, use_llm).await
    }

    async fn analyze_plies(
        &self,
        plies: &[Ply],
        wanted: std::ops::Range<usize>,
        use_llm: bool,
    ) -> Result<Vec<PositionAnalysis>, AnalysisError> {
        let mut history: Vec<String> = plies.first().map(|p| p.fen_before.clone()).into_iter().collect();
        let mut analyses = Vec::new();

        for ply in plies {
            if wanted.contains(&ply.index) {
                let pos = parse_fen(&ply.fen_after)?;
                let record = self.evaluate_position(&pos, &history).await;

                let explanation = if use_llm && record.score.is_known() {
                    let ctx = MoveContext {
                        move_index: ply.index,
                        ..MoveContext::default()
                    };
                    Some(self.commentator.comment(&record, ctx, true).await)
                } else {
                    None
                };

                analyses.push(PositionAnalysis {
                    move_number: ply.index,
                    position_fen: ply.fen_after.clone(),
                    move_san: ply.san.clone(),
                    evaluation: record.formatted_score(),
                    best_move: record.best_move_san().map(str::to_string),
                    variations: variation_summaries(&record),
                    explanation,
                    record,
                });
            }
            history.push(ply.fen_after.clone());
        }

        Ok(analyses)
    }

    /// Play up to ten moves (SAN or UCI, whitespace separated) from
    /// `start_fen`, evaluating and commenting each resulting position.
    /// Moves that do not parse in the current position are skipped.
    pub async fn explore_variation(
        &self,
        start_fen: &str,
        moves: &str,
    ) -> Result<Vec<VariationStep>, AnalysisError> {
        let mut pos = parse_fen(start_fen)?;
        let mut history = vec![fen_of(&pos)];
        let mut steps = Vec::new();

        for (i, token) in moves.split_whitespace().take(MAX_VARIATION_MOVES).enumerate() {
            let Some(mv) = parse_move(&pos, token) else {
                warn!(token, "Invalid move in variation, skipping");
                continue;
            };

            let san = san_of(&pos, &mv);
            pos.play_unchecked(mv);
            let fen = fen_of(&pos);

            let record = self.evaluate_position(&pos, &history).await;
            let ctx = MoveContext {
                move_index: i + 1,
                ..MoveContext::default()
            };
            let explanation = self.commentator.comment(&record, ctx, true).await;

            steps.push(VariationStep {
                move_number: i + 1,
                san,
                fen: fen.clone(),
                evaluation: record.formatted_score(),
                explanation,
                best_move: record.best_move_san().map(str::to_string),
                variations: variation_summaries(&record),
            });
            history.push(fen);
        }

        Ok(steps)
    }
}

/// Parse a PGN and replay its mainline.
pub fn mainline(pgn: &str) -> Result<Vec<Ply>, AnalysisError> {
    let game = parse_pgn(pgn).ok_or_else(|| AnalysisError::InvalidPgn("Invalid PGN content".to_string()))?;
    Ok(replay_mainline(game.start_fen.as_deref(), &game.moves)?)
}
