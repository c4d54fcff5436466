use serde_json::{json, Value as JsonValue};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use review_engine::{MoveAnalysis, PositionAnalysis, Source};

use crate::error::AppError;

fn source_label(source: Source) -> &'static str {
    match source {
        Source::Remote => "remote",
        Source::Fallback => "fallback",
        Source::Terminal => "terminal",
    }
}

/// Stored single-move analysis in the `/analyse_move` response shape.
pub async fn get_move_analysis(
    pool: &PgPool,
    game_id: i64,
    move_index: usize,
) -> Result<Option<JsonValue>, AppError> {
    let row = sqlx::query(
        r#"SELECT evaluation, explanation, variations, played_best, source
           FROM move_analysis_cache WHERE game_id = $1 AND move_index = $2"#,
    )
    .bind(game_id)
    .bind(move_index as i32)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(row.map(|r| {
        json!({
            "eval": r.try_get::<String, _>("evaluation").unwrap_or_default(),
            "explanation": r.try_get::<Option<String>, _>("explanation").unwrap_or(None),
            "variations": r.try_get::<JsonValue, _>("variations").unwrap_or_else(|_| json!([])),
            "played_best": r.try_get::<bool, _>("played_best").unwrap_or(false),
            "source": r.try_get::<String, _>("source").unwrap_or_default(),
            "cached": true,
        })
    }))
}

/// First writer wins; a concurrent duplicate is dropped.
pub async fn save_move_analysis(
    pool: &PgPool,
    game_id: i64,
    analysis: &MoveAnalysis,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO move_analysis_cache (
            game_id, move_index, position_fen, evaluation, explanation,
            variations, played_best, source, record
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (game_id, move_index) DO NOTHING"#,
    )
    .bind(game_id)
    .bind(analysis.move_index as i32)
    .bind(&analysis.fen)
    .bind(&analysis.evaluation)
    .bind(&analysis.explanation.text)
    .bind(Json(&analysis.variations))
    .bind(analysis.played_best)
    .bind(source_label(analysis.source))
    .bind(Json(&analysis.record))
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(())
}

/// Insert per-ply analyses, keeping rows that already exist. Returns the
/// number of rows actually written.
pub async fn save_position_analyses(
    pool: &PgPool,
    game_id: i64,
    analyses: &[PositionAnalysis],
) -> Result<u64, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;
    let mut inserted = 0;

    for a in analyses {
        let result = sqlx::query(
            r#"INSERT INTO analyses (
                game_id, move_number, position_fen, move_san, evaluation,
                score, best_move, analysis_engine, variations, explanation
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (game_id, move_number) DO NOTHING"#,
        )
        .bind(game_id)
        .bind(a.move_number as i32)
        .bind(&a.position_fen)
        .bind(&a.move_san)
        .bind(&a.evaluation)
        .bind(Json(&a.record.score))
        .bind(&a.best_move)
        .bind(engine_label(a.record.source))
        .bind(Json(&a.variations))
        .bind(a.explanation.as_ref().map(|e| e.text.as_str()))
        .execute(&mut *tx)
        .await
        .map_err(AppError::Sqlx)?;
        inserted += result.rows_affected();
    }

    tx.commit().await.map_err(AppError::Sqlx)?;
    Ok(inserted)
}

/// `analysis_engine` column: which evaluator produced the row.
fn engine_label(source: Source) -> &'static str {
    match source {
        Source::Remote => "lichess",
        Source::Fallback => "basic",
        Source::Terminal => "terminal",
    }
}

pub async fn count_analyses(pool: &PgPool, game_id: i64) -> Result<i64, AppError> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM analyses WHERE game_id = $1")
        .bind(game_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Sqlx)?;

    Ok(row.try_get::<i64, _>("n").unwrap_or(0))
}

/// All stored per-ply analyses of a game, in move order.
pub async fn get_game_analyses(pool: &PgPool, game_id: i64) -> Result<Vec<JsonValue>, AppError> {
    let rows = sqlx::query(
        r#"SELECT id, move_number, position_fen, move_san, evaluation, score,
                  best_move, analysis_engine, variations, explanation, created_at
           FROM analyses WHERE game_id = $1 ORDER BY move_number"#,
    )
    .bind(game_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(rows
        .iter()
        .map(|r| {
            json!({
                "id": r.try_get::<i64, _>("id").unwrap_or(0),
                "game_id": game_id,
                "move_number": r.try_get::<i32, _>("move_number").unwrap_or(0),
                "position_fen": r.try_get::<String, _>("position_fen").unwrap_or_default(),
                "move_san": r.try_get::<String, _>("move_san").unwrap_or_default(),
                "evaluation": r.try_get::<String, _>("evaluation").unwrap_or_default(),
                "score": r.try_get::<JsonValue, _>("score").unwrap_or(JsonValue::Null),
                "best_move": r.try_get::<Option<String>, _>("best_move").unwrap_or(None),
                "analysis_engine": r.try_get::<String, _>("analysis_engine").unwrap_or_default(),
                "variations": r.try_get::<JsonValue, _>("variations").unwrap_or_else(|_| json!([])),
                "explanation": r.try_get::<Option<String>, _>("explanation").unwrap_or(None),
                "created_at": r
                    .try_get::<chrono::DateTime<chrono::Utc>, _>("created_at")
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default(),
            })
        })
        .collect())
}
