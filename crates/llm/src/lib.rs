//! Text generation crate for StructRAG.
//!
//! Provides a provider-agnostic streaming interface to language models.
//! Callers send a prompt with generation options and receive an ordered
//! stream of text chunks; `generate_text` collects one to completion under
//! a cancellation token.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Mock**: Scripted replies for tests
//!
//! # Example
//! ```no_run
//! use structrag_llm::{generate_text, LlmRequest, OllamaClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new("llama3.2");
//! let cancel = CancellationToken::new();
//! let text = generate_text(&client, &LlmRequest::new("Hello, world!"), &cancel).await?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    collect_stream, generate_text, GenerationOptions, LlmClient, LlmRequest, LlmStream,
    LlmStreamChunk, LlmUsage,
};
pub use factory::create_client;
pub use providers::{MockClient, MockReply, OllamaClient};
