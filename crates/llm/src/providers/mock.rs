//! Scripted provider for tests and offline runs.
//!
//! A `MockClient` answers each prompt through a closure and records every
//! prompt it receives, in call order.

use crate::client::{LlmClient, LlmRequest, LlmStream, LlmStreamChunk};
use std::sync::{Arc, Mutex};
use structrag_core::{AppError, AppResult};
use tokio_util::sync::CancellationToken;

/// What the mock does with one prompt.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Stream these chunks, then finish.
    Text(Vec<String>),
    /// Stream these chunks, then never finish.
    Hang(Vec<String>),
    /// Fail the call.
    Fail(String),
}

impl MockReply {
    /// Single-chunk reply.
    pub fn text(content: impl Into<String>) -> Self {
        MockReply::Text(vec![content.into()])
    }
}

type Responder = dyn Fn(&str) -> MockReply + Send + Sync;

/// Scripted text generation client.
#[derive(Clone)]
pub struct MockClient {
    responder: Arc<Responder>,
    prompts: Arc<Mutex<Vec<LlmRequest>>>,
}

impl MockClient {
    /// Create a mock that answers through `responder`.
    pub fn new(responder: impl Fn(&str) -> MockReply + Send + Sync + 'static) -> Self {
        Self {
            responder: Arc::new(responder),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    /// Number of generation calls made.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn stream(
        &self,
        request: &LlmRequest,
        cancel: &CancellationToken,
    ) -> AppResult<LlmStream> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.clone());
        }

        let to_items = |parts: Vec<String>| -> Vec<AppResult<LlmStreamChunk>> {
            parts.into_iter().map(|p| Ok(LlmStreamChunk::text(p))).collect()
        };

        match (self.responder)(&request.prompt) {
            MockReply::Text(parts) => Ok(Box::pin(futures::stream::iter(to_items(parts)))),
            MockReply::Hang(parts) => {
                use futures::StreamExt;
                Ok(Box::pin(
                    futures::stream::iter(to_items(parts)).chain(futures::stream::pending()),
                ))
            }
            MockReply::Fail(message) => Err(AppError::Llm(message)),
        }
    }
}
