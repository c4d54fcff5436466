use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run the full Postgres schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Uploaded games
CREATE TABLE IF NOT EXISTS games (
    id           BIGSERIAL PRIMARY KEY,
    title        TEXT NOT NULL,
    pgn_content  TEXT NOT NULL,
    white_player TEXT,
    black_player TEXT,
    result       TEXT,
    date_played  TEXT,
    event        TEXT,
    site         TEXT,
    round        TEXT,
    eco          TEXT,
    move_count   INTEGER NOT NULL DEFAULT 0,
    upload_date  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_games_upload_date
    ON games (upload_date DESC);

-- Single-move analysis, one row per (game, move index)
CREATE TABLE IF NOT EXISTS move_analysis_cache (
    id           BIGSERIAL PRIMARY KEY,
    game_id      BIGINT NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    move_index   INTEGER NOT NULL,
    position_fen TEXT NOT NULL,
    evaluation   TEXT NOT NULL,
    explanation  TEXT,
    variations   JSONB NOT NULL DEFAULT '[]'::jsonb,
    played_best  BOOLEAN NOT NULL DEFAULT FALSE,
    source       TEXT NOT NULL,
    record       JSONB NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE(game_id, move_index)
);

-- Whole-game / range analysis, one row per ply
CREATE TABLE IF NOT EXISTS analyses (
    id              BIGSERIAL PRIMARY KEY,
    game_id         BIGINT NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    move_number     INTEGER NOT NULL,
    position_fen    TEXT NOT NULL,
    move_san        TEXT NOT NULL,
    evaluation      TEXT NOT NULL,
    score           JSONB NOT NULL,
    best_move       TEXT,
    analysis_engine TEXT NOT NULL DEFAULT 'lichess',
    variations      JSONB NOT NULL DEFAULT '[]'::jsonb,
    explanation     TEXT,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE(game_id, move_number)
);

CREATE INDEX IF NOT EXISTS idx_analyses_game_id
    ON analyses (game_id);
"#;
