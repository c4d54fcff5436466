use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::error::AppError;
use crate::state::SharedAnalyzer;

#[derive(Deserialize)]
pub struct ExploreVariationRequest {
    pub start_fen: String,
    /// SAN or UCI moves separated by whitespace.
    pub variation_moves: String,
}

/// POST /api/v1/explore_variation
pub async fn explore_variation(
    Extension(analyzer): Extension<SharedAnalyzer>,
    Json(body): Json<ExploreVariationRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let steps = analyzer
        .explore_variation(&body.start_fen, &body.variation_moves)
        .await?;
    tracing::info!(steps = steps.len(), "Variation explored");

    Ok(Json(json!({ "variation_analysis": steps })))
}
