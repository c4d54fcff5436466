use server::config;
use server::db;
use server::routes;
use server::state;

use axum::{routing::{get, post}, Extension, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;

    // Connect to Postgres
    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url).await?;

    // Run schema migrations
    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool).await?;

    let analyzer = state::build_analyzer(&config.review)?;
    if analyzer.commentator().has_backend() {
        tracing::info!(model = %config.review.llm_model, "Language model commentary enabled");
    } else {
        tracing::info!("No LLM key configured - template commentary only");
    }

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/upload_pgn", post(routes::games::upload_pgn))
        .route("/analyse_move", post(routes::analysis::analyse_move))
        .route("/explore_variation", post(routes::variations::explore_variation))
        // Games: specific routes before parameterized
        .route("/games", get(routes::games::list_games))
        .route("/games/upload", post(routes::games::upload_game))
        .route(
            "/games/{game_id}",
            get(routes::games::get_game).delete(routes::games::delete_game),
        )
        .route("/games/{game_id}/analyze", post(routes::analysis::analyze_game))
        .route("/games/{game_id}/analyze_limited", post(routes::analysis::analyze_limited))
        .route("/games/{game_id}/analysis", get(routes::analysis::get_analysis))
        .route("/games/{game_id}/export", get(routes::games::export_game));

    let app = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api)
        // Shared state
        .layer(Extension(pool))
        .layer(Extension(analyzer))
        .layer(CompressionLayer::new())
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
