//! Cloud evaluation client (Lichess cloud-eval API)
//!
//! One GET per position with `fen`, `multiPv` and `depth`. The response is
//! a JSON object with a `pvs` array; each entry may carry `cp` or `mate`
//! (White POV) and its moves under `moves` or `pv`.

use std::future::Future;

use reqwest::{Client, StatusCode};
use serde_json::Value as JsonValue;
use shakmaty::{Chess, Position};
use tracing::debug;

use chess_core::notation::fen_of;

use crate::config::ReviewConfig;
use crate::error::CloudEvalError;
use crate::record::{EvaluationRecord, Source, Variation};
use crate::score::{RawScore, Score, Side};
use crate::variation::{decode_line, extract_moves, DRILL_DOWN_PLIES, TOP_LEVEL_PLIES};

/// Anything that can answer a cloud-eval style query with raw JSON.
pub trait EvalSource: Send + Sync {
    fn fetch(
        &self,
        fen: &str,
        multi_pv: u32,
        depth: u32,
    ) -> impl Future<Output = Result<JsonValue, CloudEvalError>> + Send;
}

pub struct LichessCloudClient {
    client: Client,
    url: String,
}

impl LichessCloudClient {
    pub fn new(config: &ReviewConfig) -> Result<Self, CloudEvalError> {
        let client = Client::builder()
            .user_agent("CloudReview/1.0")
            .timeout(config.cloud_eval_timeout)
            .build()
            .map_err(|e| CloudEvalError::Connection(format!("Client build error: {e}")))?;
        Ok(Self {
            client,
            url: config.cloud_eval_url.clone(),
        })
    }
}

impl EvalSource for LichessCloudClient {
    async fn fetch(&self, fen: &str, multi_pv: u32, depth: u32) -> Result<JsonValue, CloudEvalError> {
        let params = [
            ("fen", fen.to_string()),
            ("multiPv", multi_pv.to_string()),
            ("depth", depth.to_string()),
        ];

        let resp = self
            .client
            .get(&self.url)
            .query(&params)
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CloudEvalError::NotFound);
        }
        if status != StatusCode::OK {
            return Err(CloudEvalError::HttpStatus(status.as_u16()));
        }

        resp.json::<JsonValue>().await.map_err(|e| {
            if e.is_timeout() {
                CloudEvalError::Timeout
            } else {
                CloudEvalError::Decode(e.to_string())
            }
        })
    }
}

fn request_error(e: reqwest::Error) -> CloudEvalError {
    if e.is_timeout() {
        CloudEvalError::Timeout
    } else {
        CloudEvalError::Connection(e.to_string())
    }
}

/// Normalize a cloud-eval body into an [`EvaluationRecord`] for `pos`.
///
/// At most `multi_pv` lines are kept. Each line keeps its coordinate moves
/// up to the drill-down length and SAN for the display length. The record
/// score is the top line's score. A body without any principal variation
/// is a decode failure so the caller falls back.
pub fn parse_cloud_eval(
    body: &JsonValue,
    pos: &Chess,
    multi_pv: u32,
) -> Result<EvaluationRecord, CloudEvalError> {
    let pvs = body
        .get("pvs")
        .and_then(|v| v.as_array())
        .ok_or_else(|| CloudEvalError::Decode("missing pvs array".to_string()))?;

    if pvs.is_empty() {
        return Err(CloudEvalError::Decode("empty pvs array".to_string()));
    }

    let turn = pos.turn();
    let variations: Vec<Variation> = pvs
        .iter()
        .take(multi_pv.max(1) as usize)
        .map(|pv| {
            let tokens = extract_moves(pv);
            let mut line = decode_line(pos, &tokens, DRILL_DOWN_PLIES);
            line.san.truncate(TOP_LEVEL_PLIES);
            Variation {
                moves: line.uci,
                san: line.san,
                score: Score::from_raw(RawScore::from_json(pv), turn),
                label: None,
            }
        })
        .collect();

    let score = variations.first().map(|v| v.score).unwrap_or(Score::Unknown);
    let best_move_uci = variations.first().and_then(|v| v.moves.first().cloned());

    debug!(
        lines = variations.len(),
        best = best_move_uci.as_deref().unwrap_or("-"),
        "Parsed cloud evaluation"
    );

    Ok(EvaluationRecord {
        fen: fen_of(pos),
        turn: Side::from(turn),
        score,
        best_move_uci,
        variations,
        source: Source::Remote,
        terminal_kind: None,
        note: None,
    })
}
