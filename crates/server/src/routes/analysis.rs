use axum::{extract::Path, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;

use chess_core::notation::STANDARD_START_FEN;
use chess_core::Ply;
use review_engine::analyzer::mainline;
use review_engine::AnalysisError;

use crate::db::{analysis, games};
use crate::error::AppError;
use crate::state::SharedAnalyzer;

#[derive(Deserialize)]
pub struct AnalyseMoveRequest {
    pub game_id: i64,
    pub move_index: i64,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub use_llm: bool,
}

#[derive(Deserialize)]
pub struct AnalyzeLimitedRequest {
    #[serde(default)]
    pub start_move: usize,
    #[serde(default)]
    pub use_llm: bool,
}

/// Position before the move at `move_index` (plies already played) and the
/// UCI of the move actually played from it, if the game continues.
pub fn position_for_move(plies: &[Ply], move_index: i64) -> Result<(String, Option<String>), AnalysisError> {
    let out_of_range = AnalysisError::MoveIndexOutOfRange {
        index: move_index,
        total: plies.len(),
    };
    let idx = usize::try_from(move_index).map_err(|_| out_of_range.clone())?;

    match plies.get(idx) {
        Some(ply) => Ok((ply.fen_before.clone(), Some(ply.uci.clone()))),
        None if idx == plies.len() => {
            let fen = plies
                .last()
                .map(|p| p.fen_after.clone())
                .unwrap_or_else(|| STANDARD_START_FEN.to_string());
            Ok((fen, None))
        }
        None => Err(out_of_range),
    }
}

/// POST /api/v1/analyse_move
pub async fn analyse_move(
    Extension(pool): Extension<PgPool>,
    Extension(analyzer): Extension<SharedAnalyzer>,
    Json(body): Json<AnalyseMoveRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let game = games::get_game(&pool, body.game_id)
        .await?
        .ok_or(AppError::NotFound("Game not found".into()))?;

    let plies = mainline(&game.pgn_content)?;
    let (fen, played) = position_for_move(&plies, body.move_index)?;
    let move_index = body.move_index as usize;

    if let Some(stored) = analysis::get_move_analysis(&pool, game.id, move_index).await? {
        tracing::debug!(game_id = game.id, move_index, "Move analysis served from store");
        return Ok(Json(stored));
    }

    let result = analyzer.analyze_move(&fen, move_index, played.as_deref()).await?;

    if let Err(e) = analysis::save_move_analysis(&pool, game.id, &result).await {
        tracing::warn!(game_id = game.id, move_index, "Failed to store move analysis: {e}");
    }

    Ok(Json(json!({
        "eval": result.evaluation,
        "explanation": result.explanation.text,
        "variations": result.variations,
        "played_best": result.played_best,
        "source": result.source,
        "cached": false,
    })))
}

/// POST /api/v1/games/{game_id}/analyze
pub async fn analyze_game(
    Extension(pool): Extension<PgPool>,
    Extension(analyzer): Extension<SharedAnalyzer>,
    Path(game_id): Path<i64>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let game = games::get_game(&pool, game_id)
        .await?
        .ok_or(AppError::NotFound("Game not found".into()))?;

    let existing = analysis::count_analyses(&pool, game_id).await?;
    if existing > 0 {
        return Ok(Json(json!({
            "message": format!("Game already analyzed ({existing} positions)"),
            "analysis_count": existing,
        })));
    }

    let results = analyzer.analyze_game(&game.pgn_content, body.use_llm).await?;
    analysis::save_position_analyses(&pool, game_id, &results).await?;
    tracing::info!(game_id, positions = results.len(), "Game analysed");

    Ok(Json(json!({
        "message": format!("Analysis completed for {} positions", results.len()),
        "analysis_count": results.len(),
    })))
}

/// POST /api/v1/games/{game_id}/analyze_limited
pub async fn analyze_limited(
    Extension(pool): Extension<PgPool>,
    Extension(analyzer): Extension<SharedAnalyzer>,
    Path(game_id): Path<i64>,
    Json(body): Json<AnalyzeLimitedRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let game = games::get_game(&pool, game_id)
        .await?
        .ok_or(AppError::NotFound("Game not found".into()))?;

    let results = analyzer
        .analyze_range(&game.pgn_content, body.start_move, body.use_llm)
        .await?;
    let inserted = analysis::save_position_analyses(&pool, game_id, &results).await?;
    tracing::info!(game_id, start_move = body.start_move, inserted, "Range analysed");

    Ok(Json(json!({
        "message": format!("Limited analysis completed for {} positions", results.len()),
        "analysis_count": results.len(),
        "new_analyses": inserted,
    })))
}

/// GET /api/v1/games/{game_id}/analysis
pub async fn get_analysis(
    Extension(pool): Extension<PgPool>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonValue>, AppError> {
    games::get_game(&pool, game_id)
        .await?
        .ok_or(AppError::NotFound("Game not found".into()))?;

    let analyses = analysis::get_game_analyses(&pool, game_id).await?;
    Ok(Json(json!(analyses)))
}
