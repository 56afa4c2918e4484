//! Structure-aware retrieval-augmented answering.
//!
//! Given a question and the fragments a retriever returns for it, the
//! pipeline picks a knowledge structure (graph, table, algorithm, catalogue
//! or raw chunks), restructures the fragments, decomposes the question,
//! extracts knowledge per sub-question and merges a cited answer.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use std::path::Path;
//! use structrag_core::SearchConfig;
//! use structrag_llm::OllamaClient;
//! use structrag_prompt::TemplateStore;
//! use structrag_search::{RequestContext, SnapshotRetriever, StructRagClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = StructRagClient::new(
//!     Arc::new(SnapshotRetriever::load_dir(Path::new(".structrag/indexes"))?),
//!     Arc::new(OllamaClient::new("llama3.2")),
//!     TemplateStore::load_dir(Path::new("prompts"))?,
//!     SearchConfig::default(),
//! )?;
//!
//! let answer = client
//!     .ask("default", "What is StructRAG?", &[], 0.0, &RequestContext::new(), &CancellationToken::new())
//!     .await?;
//! println!("{}", answer.result);
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod rag;
pub mod retriever;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use context::RequestContext;
pub use rag::{StructRagClient, StructureType, StructuredKnowledge, REQUIRED_TEMPLATES};
pub use retriever::Retriever;
pub use snapshot::SnapshotRetriever;
pub use types::{Answer, Citation, Fragment, MemoryFilter, Partition, SearchResult, TagMap};
