use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use chess_core::GameMetadata;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct StoredGame {
    pub id: i64,
    pub title: String,
    pub pgn_content: String,
    pub white_player: Option<String>,
    pub black_player: Option<String>,
    pub result: Option<String>,
    pub date_played: Option<String>,
    pub event: Option<String>,
    pub site: Option<String>,
    pub round: Option<String>,
    pub eco: Option<String>,
    pub move_count: i32,
    pub upload_date: DateTime<Utc>,
}

impl StoredGame {
    pub fn metadata(&self) -> GameMetadata {
        GameMetadata {
            white_player: self.white_player.clone(),
            black_player: self.black_player.clone(),
            event: self.event.clone(),
            result: self.result.clone(),
            date: self.date_played.clone(),
            site: self.site.clone(),
            round: self.round.clone(),
            eco: self.eco.clone(),
        }
    }
}

const GAME_COLUMNS: &str = "id, title, pgn_content, white_player, black_player, result, \
     date_played, event, site, round, eco, move_count, upload_date";

fn game_from_row(r: &PgRow) -> StoredGame {
    StoredGame {
        id: r.try_get("id").unwrap_or(0),
        title: r.try_get("title").unwrap_or_default(),
        pgn_content: r.try_get("pgn_content").unwrap_or_default(),
        white_player: r.try_get("white_player").unwrap_or(None),
        black_player: r.try_get("black_player").unwrap_or(None),
        result: r.try_get("result").unwrap_or(None),
        date_played: r.try_get("date_played").unwrap_or(None),
        event: r.try_get("event").unwrap_or(None),
        site: r.try_get("site").unwrap_or(None),
        round: r.try_get("round").unwrap_or(None),
        eco: r.try_get("eco").unwrap_or(None),
        move_count: r.try_get("move_count").unwrap_or(0),
        upload_date: r.try_get("upload_date").unwrap_or_else(|_| Utc::now()),
    }
}

/// Insert a parsed game. Returns the new game id.
pub async fn insert_game(
    pool: &PgPool,
    title: &str,
    pgn_content: &str,
    metadata: &GameMetadata,
    move_count: usize,
) -> Result<i64, AppError> {
    let row = sqlx::query(
        r#"INSERT INTO games (
            title, pgn_content, white_player, black_player, result,
            date_played, event, site, round, eco, move_count
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id"#,
    )
    .bind(title)
    .bind(pgn_content)
    .bind(&metadata.white_player)
    .bind(&metadata.black_player)
    .bind(&metadata.result)
    .bind(&metadata.date)
    .bind(&metadata.event)
    .bind(&metadata.site)
    .bind(&metadata.round)
    .bind(&metadata.eco)
    .bind(move_count as i32)
    .fetch_one(pool)
    .await
    .map_err(AppError::Sqlx)?;

    row.try_get("id").map_err(AppError::Sqlx)
}

/// Newest uploads first.
pub async fn list_games(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<StoredGame>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {GAME_COLUMNS} FROM games ORDER BY upload_date DESC, id DESC OFFSET $1 LIMIT $2"
    ))
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(rows.iter().map(game_from_row).collect())
}

pub async fn get_game(pool: &PgPool, game_id: i64) -> Result<Option<StoredGame>, AppError> {
    let row = sqlx::query(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
        .bind(game_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)?;

    Ok(row.as_ref().map(game_from_row))
}

/// Delete a game; its analyses go with it. False when nothing was deleted.
pub async fn delete_game(pool: &PgPool, game_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM games WHERE id = $1")
        .bind(game_id)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;

    Ok(result.rows_affected() > 0)
}
