//! OpenAI-compatible chat completion client (Groq by default).

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ReviewConfig;
use crate::error::LlmError;

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

pub trait CompletionBackend: Send + Sync {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

// *************** Wire types ***************

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// *************** Client ***************

pub struct GroqClient {
    client: Client,
    url: String,
    api_key: String,
}

impl GroqClient {
    /// None when no API key is configured.
    pub fn from_config(config: &ReviewConfig) -> Result<Option<Self>, LlmError> {
        let Some(api_key) = config.llm_api_key.clone() else {
            return Ok(None);
        };
        let client = Client::builder()
            .user_agent("CloudReview/1.0")
            .timeout(config.llm_timeout)
            .build()
            .map_err(|e| LlmError::Request(format!("Client build error: {e}")))?;
        Ok(Some(Self {
            client,
            url: config.llm_api_url.clone(),
            api_key,
        }))
    }
}

impl CompletionBackend for GroqClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LlmError::Status(resp.status().as_u16()));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;
        parse_chat_response(&text)
    }
}

/// First choice's message content, trimmed.
pub fn parse_chat_response(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(content)
    }
}
