//! Review configuration from environment variables

use std::env;
use std::time::Duration;

use tracing::{info, warn};

pub const DEFAULT_CLOUD_EVAL_URL: &str = "https://lichess.org/api/cloud-eval";
pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Clone, Debug)]
pub struct ReviewConfig {
    /// Cloud evaluation endpoint
    pub cloud_eval_url: String,

    /// Principal variations requested per position
    pub multi_pv: u32,

    /// Target search depth (best-effort on the remote side)
    pub search_depth: u32,

    /// Per-request timeout for the cloud evaluation call
    pub cloud_eval_timeout: Duration,

    /// Cache fallback results for positions the cloud database does not know
    pub cache_not_found: bool,

    /// Language-model API key; None disables LLM commentary
    pub llm_api_key: Option<String>,

    /// OpenAI-compatible chat completions endpoint
    pub llm_api_url: String,

    pub llm_model: String,

    pub llm_timeout: Duration,

    pub llm_temperature: f32,

    pub llm_max_tokens: u32,

    /// Plies at the start of a game that get an opening note instead of analysis
    pub skip_book_moves: usize,

    /// Sleep between positions in the interactive review
    pub polite_delay: Duration,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            cloud_eval_url: DEFAULT_CLOUD_EVAL_URL.to_string(),
            multi_pv: 3,
            search_depth: 15,
            cloud_eval_timeout: Duration::from_secs(15),
            cache_not_found: true,
            llm_api_key: None,
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout: Duration::from_secs(20),
            llm_temperature: 0.2,
            llm_max_tokens: 80,
            skip_book_moves: 6,
            polite_delay: Duration::from_millis(100),
        }
    }
}

impl ReviewConfig {
    /// Load configuration from environment variables, keeping defaults for
    /// anything missing or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let llm_api_key = env::var("GROQ_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && !k.starts_with("your_groq_api_key"));

        if llm_api_key.is_some() {
            info!("Language-model commentary enabled");
        } else {
            warn!("GROQ_API_KEY not set or using placeholder value; commentary will use templates");
        }

        Self {
            cloud_eval_url: env::var("LICHESS_CLOUD_EVAL_URL").unwrap_or(defaults.cloud_eval_url),
            multi_pv: parse_var("MULTI_PV").unwrap_or(defaults.multi_pv),
            search_depth: parse_var("SEARCH_DEPTH").unwrap_or(defaults.search_depth),
            cloud_eval_timeout: parse_var("CLOUD_EVAL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cloud_eval_timeout),
            cache_not_found: parse_var("CACHE_NOT_FOUND").unwrap_or(defaults.cache_not_found),
            llm_api_key,
            llm_api_url: env::var("LLM_API_URL").unwrap_or(defaults.llm_api_url),
            llm_model: env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_timeout: parse_var("LLM_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.llm_timeout),
            llm_temperature: parse_var("LLM_TEMPERATURE").unwrap_or(defaults.llm_temperature),
            llm_max_tokens: parse_var("LLM_MAX_TOKENS").unwrap_or(defaults.llm_max_tokens),
            skip_book_moves: parse_var("SKIP_BOOK_MOVES").unwrap_or(defaults.skip_book_moves),
            polite_delay: parse_var("POLITE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.polite_delay),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
