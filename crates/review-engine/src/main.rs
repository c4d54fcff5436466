//! Interactive terminal game review
//!
//! Steps through a PGN one ply at a time: the board after the move, the
//! cloud evaluation of the position before it, the top engine lines and a
//! short commentary. Any engine line can be walked move by move.

use std::io::Write;

use anyhow::{anyhow, Context};
use shakmaty::{Chess, Position};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use chess_core::notation::{parse_fen, parse_move, san_of};
use chess_core::pgn::{parse_pgn, replay_mainline};
use chess_core::Ply;
use review_engine::commentary::MoveContext;
use review_engine::review::{
    header, ply_side, render_board, variation_row, ReviewCommand, LINE_PROMPT, OPENING_EVAL,
    OPENING_NOTE, PROMPT,
};
use review_engine::variation::{DRILL_DOWN_PLIES, NESTED_PLIES, TOP_LEVEL_PLIES};
use review_engine::{
    Analyzer, Commentator, EvalSettings, EvaluationRecord, GroqClient, LichessCloudClient,
    ReviewConfig, Source,
};

type CloudAnalyzer = Analyzer<LichessCloudClient, GroqClient>;
type Input = Lines<BufReader<Stdin>>;

/// First non-flag argument.
fn parse_pgn_path() -> Option<String> {
    std::env::args().skip(1).find(|a| !a.starts_with('-'))
}

async fn prompt(input: &mut Input, text: &str) -> anyhow::Result<String> {
    print!("{text}");
    std::io::stdout().flush()?;
    // EOF behaves like Enter.
    Ok(input.next_line().await?.unwrap_or_default())
}

fn print_lines(record: &EvaluationRecord, indent: &str, max_plies: usize) {
    if record.variations.is_empty() {
        println!("{indent}No variations returned by Lichess.");
        return;
    }
    if record.source == Source::Fallback {
        println!("{indent}Cloud evaluation unavailable, basic suggestions:");
        for (i, v) in record.variations.iter().enumerate() {
            println!("{indent}  {}. {}", i + 1, v.summary());
        }
        return;
    }
    for (i, v) in record.variations.iter().enumerate() {
        println!("{indent}  {}", variation_row(i + 1, v, record, max_plies));
    }
}

/// Walk an engine line from `start`, showing the evaluation before each
/// move and the top lines of every position on the way.
async fn walk_line(
    analyzer: &CloudAnalyzer,
    config: &ReviewConfig,
    start: &Chess,
    moves: &[String],
    input: &mut Input,
) -> anyhow::Result<()> {
    if moves.is_empty() {
        println!("  Variation has no moves.");
        return Ok(());
    }

    let mut pos = start.clone();
    println!("  === Entering variation analysis mode ===");
    for (i, token) in moves.iter().take(DRILL_DOWN_PLIES).enumerate() {
        let Some(mv) = parse_move(&pos, token) else {
            println!("   Skipping unknown move: {token}");
            break;
        };

        let record = analyzer.evaluate_position(&pos, &[]).await;
        println!(
            "   Var move {}: {}   Eval (pre-move): {}",
            i + 1,
            san_of(&pos, &mv),
            record.formatted_score()
        );
        print_lines(&record, "   ", NESTED_PLIES);
        pos.play_unchecked(mv);

        let cmd = prompt(input, LINE_PROMPT).await?;
        if ReviewCommand::parse(&cmd) == ReviewCommand::Quit {
            break;
        }
        tokio::time::sleep(config.polite_delay).await;
    }
    println!("  === Exiting variation analysis mode ===\n");
    Ok(())
}

/// Print one ply. Returns the pre-move position and its evaluation, or
/// None for the opening plies that are not evaluated.
async fn show_ply(
    analyzer: &CloudAnalyzer,
    config: &ReviewConfig,
    plies: &[Ply],
    idx: usize,
) -> anyhow::Result<Option<(Chess, EvaluationRecord)>> {
    let ply = &plies[idx - 1];
    let pre = parse_fen(&ply.fen_before)?;
    let post = parse_fen(&ply.fen_after)?;

    println!("{}", render_board(&post));
    println!("Move {:>3} ({}): {}", idx, ply_side(idx), ply.san);

    if idx <= config.skip_book_moves {
        println!("  Eval (pre-move): {OPENING_EVAL}");
        println!("  Note: {OPENING_NOTE}\n");
        return Ok(None);
    }

    let history: Vec<String> = plies[..idx - 1].iter().map(|p| p.fen_before.clone()).collect();
    let record = analyzer.evaluate_position(&pre, &history).await;
    let played_best = record.played_best(Some(ply.uci.as_str()));

    println!("  Eval (pre-move): {}", record.formatted_score());
    println!("  Played best move? {}", if played_best { "YES" } else { "NO" });
    if record.source == Source::Remote {
        println!("  Top variations (up to 3):");
    }
    print_lines(&record, "  ", TOP_LEVEL_PLIES);

    let ctx = MoveContext {
        move_index: idx,
        played_san: Some(ply.san.as_str()),
        played_uci: Some(ply.uci.as_str()),
    };
    let commentary = analyzer.commentator().comment(&record, ctx, true).await;
    println!("  Note: {}\n", commentary.text);

    Ok(Some((pre, record)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they stay out of the review output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let path = parse_pgn_path().ok_or_else(|| anyhow!("Usage: cloud-review <file.pgn>"))?;
    let text = std::fs::read_to_string(&path).with_context(|| format!("PGN not found: {path}"))?;
    let game = parse_pgn(&text).ok_or_else(|| anyhow!("No game found in PGN file."))?;
    let plies = replay_mainline(game.start_fen.as_deref(), &game.moves)?;

    let config = ReviewConfig::from_env();
    let source = LichessCloudClient::new(&config)?;
    let backend = GroqClient::from_config(&config)?;
    let analyzer = Analyzer::new(
        Some(source),
        Commentator::new(backend, &config),
        EvalSettings::from(&config),
    );
    info!(path = %path, plies = plies.len(), "Reviewing game");

    println!("{}", header(&game.metadata));

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let total = plies.len();
    let mut idx = 1;

    while idx <= total {
        let shown = show_ply(&analyzer, &config, &plies, idx).await?;

        match ReviewCommand::parse(&prompt(&mut input, PROMPT).await?) {
            ReviewCommand::Next => idx += 1,
            ReviewCommand::Quit => {
                println!("User requested exit.");
                return Ok(());
            }
            ReviewCommand::SkipTo(target) if (1..=total).contains(&target) => idx = target,
            ReviewCommand::SkipTo(_) => {
                println!("  Invalid move number. Continuing to next move.");
                idx += 1;
            }
            ReviewCommand::Line(n) => {
                // Stay on the same ply afterwards.
                let line = shown
                    .as_ref()
                    .and_then(|(pre, record)| record.variations.get(n.wrapping_sub(1)).map(|v| (pre, v)));
                match line {
                    Some((pre, v)) => walk_line(&analyzer, &config, pre, &v.moves, &mut input).await?,
                    None => println!("  Variation not found. Returning."),
                }
            }
            ReviewCommand::BadNumber => {
                println!("  Invalid number. Continuing to next move.");
                idx += 1;
            }
            ReviewCommand::Unknown => {
                println!("  Unknown command, continuing to next move.");
                idx += 1;
            }
        }

        tokio::time::sleep(config.polite_delay).await;
    }

    println!("\nReview complete.");
    Ok(())
}
