use std::collections::HashMap;

use axum::{extract::Path, extract::Query, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;

use chess_core::notation::STANDARD_START_FEN;
use chess_core::pgn::{export_annotated, parse_pgn, replay_mainline};
use chess_core::{GameData, GameMetadata, Ply};
use review_engine::analyzer::mainline;
use review_engine::AnalysisError;

use crate::db::{analysis, games};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct UploadPgnRequest {
    pub pgn: String,
}

#[derive(Deserialize)]
pub struct UploadGameRequest {
    pub title: String,
    pub pgn_content: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

fn parse_game(pgn: &str) -> Result<(GameData, Vec<Ply>), AppError> {
    let game = parse_pgn(pgn).ok_or_else(|| AppError::BadRequest("Invalid PGN content".into()))?;
    let plies = replay_mainline(game.start_fen.as_deref(), &game.moves).map_err(AnalysisError::from)?;
    Ok((game, plies))
}

/// POST /api/v1/upload_pgn
pub async fn upload_pgn(
    Extension(pool): Extension<PgPool>,
    Json(body): Json<UploadPgnRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let (game, plies) = parse_game(&body.pgn)?;
    let title = game.metadata.title();
    let game_id = games::insert_game(&pool, &title, &game.pgn, &game.metadata, plies.len()).await?;
    tracing::info!(game_id, plies = plies.len(), "Uploaded PGN");

    let mut moves = vec![json!({
        "move_number": 0,
        "san": "Starting position",
        "fen": plies.first().map(|p| p.fen_before.as_str()).unwrap_or(STANDARD_START_FEN),
    })];
    moves.extend(plies.iter().map(|p| {
        json!({
            "move_number": p.index,
            "san": p.san,
            "fen": p.fen_after,
        })
    }));

    Ok(Json(json!({
        "game_id": game_id,
        "metadata": game.metadata,
        "moves": moves,
    })))
}

/// POST /api/v1/games/upload
pub async fn upload_game(
    Extension(pool): Extension<PgPool>,
    Json(body): Json<UploadGameRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    let (game, plies) = parse_game(&body.pgn_content)?;
    let game_id = games::insert_game(&pool, title, &game.pgn, &game.metadata, plies.len()).await?;
    tracing::info!(game_id, plies = plies.len(), "Uploaded game");

    let stored = games::get_game(&pool, game_id)
        .await?
        .ok_or_else(|| AppError::Internal("Uploaded game vanished".into()))?;
    Ok(Json(json!(stored)))
}

/// GET /api/v1/games
pub async fn list_games(
    Extension(pool): Extension<PgPool>,
    Query(q): Query<ListQuery>,
) -> Result<Json<JsonValue>, AppError> {
    let skip = q.skip.unwrap_or(0).max(0);
    let limit = q.limit.unwrap_or(100).clamp(1, 1000);
    let list = games::list_games(&pool, skip, limit).await?;
    Ok(Json(json!(list)))
}

/// GET /api/v1/games/{game_id}
pub async fn get_game(
    Extension(pool): Extension<PgPool>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonValue>, AppError> {
    let game = games::get_game(&pool, game_id)
        .await?
        .ok_or(AppError::NotFound("Game not found".into()))?;
    Ok(Json(json!(game)))
}

/// DELETE /api/v1/games/{game_id}
pub async fn delete_game(
    Extension(pool): Extension<PgPool>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonValue>, AppError> {
    if !games::delete_game(&pool, game_id).await? {
        return Err(AppError::NotFound("Game not found".into()));
    }
    tracing::info!(game_id, "Deleted game");
    Ok(Json(json!({ "message": "Game and analysis deleted successfully" })))
}

/// GET /api/v1/games/{game_id}/export
pub async fn export_game(
    Extension(pool): Extension<PgPool>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonValue>, AppError> {
    let game = games::get_game(&pool, game_id)
        .await?
        .ok_or(AppError::NotFound("Game not found".into()))?;
    let plies = mainline(&game.pgn_content)?;
    let stored = analysis::get_game_analyses(&pool, game_id).await?;

    let comments: HashMap<usize, String> = stored
        .iter()
        .filter_map(|a| {
            let number = a["move_number"].as_u64()? as usize;
            let text = export_comment(
                a["evaluation"].as_str().unwrap_or(""),
                a["explanation"].as_str(),
                a["best_move"].as_str(),
            );
            Some((number, text))
        })
        .collect();

    let metadata = game.metadata();
    Ok(Json(json!({
        "pgn": export_annotated(&metadata, &plies, &comments),
        "filename": export_filename(&metadata),
    })))
}

/// `[Eval: +0.30] explanation Best: Nf3`, skipping the empty parts.
pub fn export_comment(evaluation: &str, explanation: Option<&str>, best_move: Option<&str>) -> String {
    let mut parts = Vec::new();
    if !evaluation.is_empty() {
        parts.push(format!("[Eval: {evaluation}]"));
    }
    if let Some(text) = explanation.map(str::trim).filter(|t| !t.is_empty()) {
        parts.push(text.to_string());
    }
    if let Some(best) = best_move.filter(|b| !b.is_empty()) {
        parts.push(format!("Best: {best}"));
    }
    parts.join(" ")
}

pub fn export_filename(metadata: &GameMetadata) -> String {
    let clean = |name: Option<&str>, fallback: &str| -> String {
        name.filter(|n| !n.trim().is_empty())
            .unwrap_or(fallback)
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    };
    format!(
        "analyzed_{}_vs_{}.pgn",
        clean(metadata.white_player.as_deref(), "White"),
        clean(metadata.black_player.as_deref(), "Black")
    )
}
