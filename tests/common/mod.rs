use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use review_engine::llm::CompletionRequest;
use review_engine::{
    Analyzer, CloudEvalError, Commentator, CompletionBackend, EvalSettings, EvalSource, LlmError,
    ReviewConfig,
};
use serde_json::Value as JsonValue;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Cloud source that always answers with the same reply. The call counter
/// is shared so tests can read it after handing the source to an analyzer.
pub struct CountingSource {
    reply: Result<JsonValue, CloudEvalError>,
    calls: Arc<AtomicUsize>,
}

impl EvalSource for CountingSource {
    async fn fetch(&self, _fen: &str, _multi_pv: u32, _depth: u32) -> Result<JsonValue, CloudEvalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

/// Completion backend with a canned reply.
pub struct CannedBackend(pub Result<String, LlmError>);

impl CompletionBackend for CannedBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        self.0.clone()
    }
}

pub type TestAnalyzer = Analyzer<CountingSource, CannedBackend>;

pub fn settings(cache_not_found: bool) -> EvalSettings {
    EvalSettings {
        multi_pv: 3,
        depth: 15,
        cache_not_found,
    }
}

/// Analyzer over a counting source, plus the counter.
pub fn analyzer(
    reply: Result<JsonValue, CloudEvalError>,
    backend: Option<CannedBackend>,
    cache_not_found: bool,
) -> (TestAnalyzer, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = CountingSource {
        reply,
        calls: calls.clone(),
    };
    let commentator = Commentator::new(backend, &ReviewConfig::default());
    let analyzer = Analyzer::new(Some(source), commentator, settings(cache_not_found));
    (analyzer, calls)
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
