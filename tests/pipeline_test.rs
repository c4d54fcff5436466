//! End-to-end checks of the evaluation pipeline with stubbed collaborators:
//! score display, line decoding, terminal handling, caching and the
//! fallback and template downgrades.

mod common;

use std::sync::Arc;

use serde_json::json;
use shakmaty::Chess;

use chess_core::notation::parse_fen;
use common::{analyzer, calls, CannedBackend, START_FEN};
use review_engine::score::{format_raw, RawScore};
use review_engine::variation::{extract_moves, to_san_list, TOP_LEVEL_PLIES};
use review_engine::{AnalysisError, CloudEvalError, CommentarySource, LlmError, Score, Source, TerminalKind};

const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

fn cp(value: i32) -> RawScore {
    RawScore { cp: Some(value), mate: None }
}

fn mate(value: i32) -> RawScore {
    RawScore { cp: None, mate: Some(value) }
}

// ---------------------------------------------------------------------------
// Score display
// ---------------------------------------------------------------------------

#[test]
fn test_centipawns_flip_for_black() {
    assert_eq!(format_raw(cp(100), true), "-1.00");
    assert_eq!(format_raw(cp(-100), true), "+1.00");
    assert_eq!(format_raw(cp(250), false), "+2.50");
}

#[test]
fn test_mate_display() {
    assert_eq!(format_raw(mate(3), false), "#+3");
    assert_eq!(format_raw(mate(-2), true), "#+2");
    assert_eq!(format_raw(mate(-2), false), "#-2");
    assert_eq!(format_raw(RawScore::default(), false), "N/A");
}

// ---------------------------------------------------------------------------
// Line decoding
// ---------------------------------------------------------------------------

#[test]
fn test_decode_start_line() {
    let tokens = extract_moves(&json!({"moves": "e2e4 e7e5 g1f3"}));
    assert_eq!(to_san_list(&Chess::default(), &tokens, TOP_LEVEL_PLIES), vec!["e4", "e5", "Nf3"]);
}

#[test]
fn test_decode_truncates_at_illegal_token() {
    // Sixth token is a White move with Black to play.
    let tokens = extract_moves(&json!({"moves": "e2e4 e7e5 g1f3 b8c6 f1b5 h1h5 a7a6"}));
    let san = to_san_list(&Chess::default(), &tokens, TOP_LEVEL_PLIES);
    assert_eq!(san, vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_start_position_end_to_end() {
    let (a, counter) = analyzer(Ok(json!({"pvs": [{"cp": 20, "moves": "e2e4 e7e5"}]})), None, true);
    let record = a.evaluate_fen(START_FEN).await.unwrap();

    assert_eq!(record.formatted_score(), "+0.20");
    assert_eq!(record.variations[0].san, vec!["e4", "e5"]);
    assert_eq!(record.best_move_uci.as_deref(), Some("e2e4"));
    assert_eq!(record.source, Source::Remote);
    assert_eq!(calls(&counter), 1);
}

#[tokio::test]
async fn test_fools_mate_is_terminal_without_remote_call() {
    let (a, counter) = analyzer(Ok(json!({"pvs": [{"cp": 0, "moves": "e2e4"}]})), None, true);
    let record = a.evaluate_fen(FOOLS_MATE).await.unwrap();

    assert_eq!(record.source, Source::Terminal);
    assert_eq!(record.terminal_kind, Some(TerminalKind::Checkmate));
    // White to move and mated.
    assert_eq!(record.formatted_score(), "#-0");
    assert_eq!(calls(&counter), 0);
}

#[tokio::test]
async fn test_stalemate_scores_zero() {
    let (a, counter) = analyzer(Err(CloudEvalError::Timeout), None, true);
    let record = a.evaluate_fen(STALEMATE).await.unwrap();

    assert_eq!(record.score, Score::Centipawns(0.0));
    assert_eq!(record.source, Source::Terminal);
    assert_eq!(record.terminal_kind, Some(TerminalKind::Stalemate));
    assert_eq!(calls(&counter), 0);
}

#[tokio::test]
async fn test_repeat_lookup_served_from_cache() {
    let (a, counter) = analyzer(Ok(json!({"pvs": [{"cp": 20, "moves": "e2e4 e7e5"}]})), None, true);
    let first = a.evaluate_fen(START_FEN).await.unwrap();
    let second = a.evaluate_fen(START_FEN).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls(&counter), 1);
}

#[tokio::test]
async fn test_timeout_yields_numeric_fallback() {
    let (a, _) = analyzer(Err(CloudEvalError::Timeout), None, true);
    let record = a.evaluate_fen(START_FEN).await.unwrap();

    assert_eq!(record.source, Source::Fallback);
    assert!(matches!(record.score, Score::Centipawns(_)));
    assert!(!record.variations.is_empty());
}

#[tokio::test]
async fn test_not_found_policy() {
    let (cached, counter) = analyzer(Err(CloudEvalError::NotFound), None, true);
    cached.evaluate_fen(START_FEN).await.unwrap();
    cached.evaluate_fen(START_FEN).await.unwrap();
    assert_eq!(calls(&counter), 1);

    let (uncached, counter) = analyzer(Err(CloudEvalError::NotFound), None, false);
    uncached.evaluate_fen(START_FEN).await.unwrap();
    uncached.evaluate_fen(START_FEN).await.unwrap();
    assert_eq!(calls(&counter), 2);
}

#[tokio::test]
async fn test_invalid_fen_surfaces() {
    let (a, counter) = analyzer(Err(CloudEvalError::Timeout), None, true);
    let err = a.evaluate_fen("rnbqkbnr/pppppppp/8 w").await.unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidPosition(_)));
    assert_eq!(calls(&counter), 0);
}

#[tokio::test]
async fn test_concurrent_lookups_share_cache() {
    let (a, _) = analyzer(Ok(json!({"pvs": [{"cp": 35, "moves": "d2d4 d7d5"}]})), None, true);
    let a = Arc::new(a);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let a = a.clone();
            tokio::spawn(async move { a.evaluate_fen(START_FEN).await })
        })
        .collect();

    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert_eq!(record.formatted_score(), "+0.35");
    }
    assert_eq!(a.cache().len(), 1);
}

// ---------------------------------------------------------------------------
// Commentary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_llm_reply_is_tagged() {
    let backend = CannedBackend(Ok("  Solid central play.  ".to_string()));
    let (a, _) = analyzer(Ok(json!({"pvs": [{"cp": 20, "moves": "e2e4 e7e5"}]})), Some(backend), true);
    let analysis = a.analyze_move(START_FEN, 0, Some("e4")).await.unwrap();

    assert!(analysis.played_best);
    assert_eq!(analysis.explanation.generated_by, CommentarySource::LanguageModel);
    assert_eq!(
        analysis.explanation.text,
        "Solid central play. [Source: Lichess engine analysis]"
    );
}

#[tokio::test]
async fn test_llm_failure_downgrades_to_template() {
    let backend = CannedBackend(Err(LlmError::Status(503)));
    let (a, _) = analyzer(Ok(json!({"pvs": [{"cp": 20, "moves": "e2e4 e7e5"}]})), Some(backend), true);
    let analysis = a.analyze_move(START_FEN, 0, Some("d4")).await.unwrap();

    assert!(!analysis.played_best);
    assert_eq!(analysis.explanation.generated_by, CommentarySource::Template);
    assert!(analysis.explanation.text.contains("Best move: e4"));
}

#[tokio::test]
async fn test_game_analysis_over_pgn() {
    let (a, _) = analyzer(Err(CloudEvalError::Connection("offline".into())), None, true);
    let pgn = "[White \"A\"]\n[Black \"B\"]\n\n1. f3 e5 2. g4 Qh4# 0-1";
    let analyses = a.analyze_game(pgn, true).await.unwrap();

    assert_eq!(analyses.len(), 4);
    let last = analyses.last().unwrap();
    assert_eq!(last.move_san, "Qh4#");
    assert_eq!(last.record.terminal_kind, Some(TerminalKind::Checkmate));
    assert_eq!(last.position_fen, FOOLS_MATE);
    assert!(parse_fen(&last.position_fen).is_ok());
}
