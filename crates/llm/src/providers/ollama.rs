//! Ollama provider implementation.
//!
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{GenerationOptions, LlmClient, LlmRequest, LlmStream, LlmStreamChunk, LlmUsage};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use structrag_core::{AppError, AppResult};
use tokio_util::sync::CancellationToken;

/// Ollama `/api/generate` request body.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

/// Ollama model options.
#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

/// One line of the newline-delimited response stream.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama text generation client.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Default URL: http://localhost:11434
    pub const DEFAULT_URL: &'static str = "http://localhost:11434";

    /// Create a client for `model` on the default local endpoint.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_base_url(Self::DEFAULT_URL, model)
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_ollama_request(&self, request: &LlmRequest) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            stream: true,
            options: to_ollama_options(&request.options),
        }
    }
}

fn to_ollama_options(options: &GenerationOptions) -> OllamaOptions {
    if !options.token_selection_biases.is_empty() {
        tracing::debug!(
            "Ollama does not support token selection biases, ignoring {} entries",
            options.token_selection_biases.len()
        );
    }

    OllamaOptions {
        num_predict: options.max_tokens,
        temperature: options.temperature,
        top_p: options.top_p,
        presence_penalty: options.presence_penalty,
        frequency_penalty: options.frequency_penalty,
        stop: options.stop_sequences.clone(),
    }
}

fn parse_line(line: &str) -> AppResult<LlmStreamChunk> {
    let response: OllamaResponse = serde_json::from_str(line)
        .map_err(|e| AppError::Llm(format!("Failed to parse chunk: {}", e)))?;

    let usage = response.done.then(|| {
        LlmUsage::new(
            response.prompt_eval_count.unwrap_or(0),
            response.eval_count.unwrap_or(0),
        )
    });

    Ok(LlmStreamChunk {
        content: response.response,
        done: response.done,
        usage,
    })
}

/// Maximum bytes held for one unfinished line (1MB)
const MAX_LINE_BUFFER: usize = 1_048_576;

/// Splits raw bytes into complete lines.
///
/// Bytes are kept undecoded until a newline arrives, so a multi-byte
/// character split across network reads is decoded whole.
#[derive(Debug)]
struct LineBuffer {
    pending: Vec<u8>,
    max_len: usize,
}

impl LineBuffer {
    fn with_capacity(max_len: usize) -> Self {
        Self {
            pending: Vec::with_capacity(4096),
            max_len,
        }
    }

    /// Append `bytes` and return every line they complete.
    fn push(&mut self, bytes: &[u8]) -> AppResult<Vec<String>> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(line) = decode_line(&line[..pos])? {
                lines.push(line);
            }
        }

        if self.pending.len() > self.max_len {
            return Err(AppError::Llm(format!(
                "Buffer overflow: {} bytes without a newline exceeds maximum {}",
                self.pending.len(),
                self.max_len
            )));
        }

        Ok(lines)
    }

    /// Take whatever is left once the stream has ended.
    fn finish(&mut self) -> AppResult<Option<String>> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }
}

fn decode_line(bytes: &[u8]) -> AppResult<Option<String>> {
    let line = std::str::from_utf8(bytes)
        .map_err(|e| AppError::Llm(format!("Invalid UTF-8 in response stream: {}", e)))?
        .trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}

/// Turn a raw NDJSON byte stream into parsed chunks.
///
/// A trailing line without a newline is parsed when the input ends.
fn decode_stream<S, B, E>(bytes: S) -> impl Stream<Item = AppResult<LlmStreamChunk>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    bytes
        .map(Some)
        .chain(futures::stream::once(futures::future::ready(None)))
        .scan(
            LineBuffer::with_capacity(MAX_LINE_BUFFER),
            |buffer, item| {
                let lines = match item {
                    Some(Ok(bytes)) => buffer.push(bytes.as_ref()),
                    Some(Err(e)) => Err(AppError::Llm(format!("Stream error: {}", e))),
                    None => buffer.finish().map(|rest| rest.into_iter().collect()),
                };
                let items: Vec<AppResult<LlmStreamChunk>> = match lines {
                    Ok(lines) => lines.iter().map(|line| parse_line(line)).collect(),
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(futures::stream::iter(items)))
            },
        )
        .flatten()
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn stream(
        &self,
        request: &LlmRequest,
        cancel: &CancellationToken,
    ) -> AppResult<LlmStream> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        tracing::debug!(
            model = %self.model,
            prompt_len = request.prompt.len(),
            "Starting streaming request to Ollama"
        );

        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&self.to_ollama_request(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send streaming request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(Box::pin(decode_stream(response.bytes_stream())))
    }
}
