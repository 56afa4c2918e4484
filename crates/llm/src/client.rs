//! Text generation client abstraction and request types.
//!
//! Every provider exposes one operation: turn a prompt plus generation
//! options into an ordered, finite stream of text chunks.

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::pin::Pin;
use structrag_core::{AppError, AppResult, SearchConfig};
use tokio_util::sync::CancellationToken;

/// Sampling and length settings for one generation call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: f32,

    /// Top-p nucleus sampling
    pub top_p: f32,

    pub presence_penalty: f32,

    pub frequency_penalty: f32,

    #[serde(default)]
    pub stop_sequences: Vec<String>,

    /// Token id -> bias
    #[serde(default)]
    pub token_selection_biases: HashMap<i32, f32>,
}

impl GenerationOptions {
    /// Static defaults taken from the search configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            max_tokens: config.answer_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
            stop_sequences: config.stop_sequences.clone(),
            token_selection_biases: config.token_selection_biases.clone(),
        }
    }
}

/// Generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The fully rendered prompt
    pub prompt: String,

    pub options: GenerationOptions,
}

impl LlmRequest {
    /// Create a new request with default options.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }

    /// Replace the generation options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A chunk from a streaming response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmStreamChunk {
    /// Incremental text content
    pub content: String,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage statistics (only in final chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

impl LlmStreamChunk {
    /// A plain text chunk.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            done: false,
            usage: None,
        }
    }
}

/// Stream of generated chunks.
pub type LlmStream = Pin<Box<dyn Stream<Item = AppResult<LlmStreamChunk>> + Send>>;

/// Trait for text generation providers.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama").
    fn provider_name(&self) -> &str;

    /// Start a streaming generation.
    ///
    /// The returned stream is ordered, finite and cannot be restarted.
    /// Providers may observe `cancel` to abort before any network work.
    async fn stream(&self, request: &LlmRequest, cancel: &CancellationToken)
        -> AppResult<LlmStream>;
}

/// Concatenate a stream in arrival order.
///
/// Returns `AppError::Cancelled` as soon as `cancel` fires; the text
/// collected so far is discarded.
pub async fn collect_stream(mut stream: LlmStream, cancel: &CancellationToken) -> AppResult<String> {
    let mut text = String::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            next = stream.next() => match next {
                Some(chunk) => {
                    let chunk = chunk?;
                    text.push_str(&chunk.content);
                    if let Some(usage) = &chunk.usage {
                        tracing::debug!(
                            "Token usage - Prompt: {}, Completion: {}, Total: {}",
                            usage.prompt_tokens,
                            usage.completion_tokens,
                            usage.total_tokens
                        );
                    }
                    if chunk.done {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    Ok(text)
}

/// Run one generation to completion.
pub async fn generate_text(
    client: &dyn LlmClient,
    request: &LlmRequest,
    cancel: &CancellationToken,
) -> AppResult<String> {
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled);
    }

    let stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AppError::Cancelled),
        stream = client.stream(request, cancel) => stream?,
    };

    collect_stream(stream, cancel).await
}
