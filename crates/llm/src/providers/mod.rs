//! Text generation provider implementations.

pub mod mock;
pub mod ollama;

pub use mock::{MockClient, MockReply};
pub use ollama::OllamaClient;
