//! Shared pipeline handle for request handlers.

use std::sync::Arc;

use review_engine::{
    Analyzer, Commentator, EvalSettings, GroqClient, LichessCloudClient, ReviewConfig,
};

pub type ServerAnalyzer = Analyzer<LichessCloudClient, GroqClient>;

/// Built once at startup and shared through an `Extension`.
pub type SharedAnalyzer = Arc<ServerAnalyzer>;

pub fn build_analyzer(config: &ReviewConfig) -> anyhow::Result<SharedAnalyzer> {
    let source = LichessCloudClient::new(config)?;
    let backend = GroqClient::from_config(config)?;
    let analyzer = Analyzer::new(
        Some(source),
        Commentator::new(backend, config),
        EvalSettings::from(config),
    );
    Ok(Arc::new(analyzer))
}
