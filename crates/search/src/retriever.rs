//! Retriever abstraction.
//!
//! The pipeline never computes similarity itself; it consumes a store
//! through this trait.

use crate::types::{Fragment, MemoryFilter};
use structrag_core::AppResult;

/// Trait for fragment stores.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Fragments similar to `text`, most relevant first.
    ///
    /// Only fragments matching `filters` with relevance of at least
    /// `min_relevance` are returned, at most `limit` of them.
    async fn similar(
        &self,
        index: &str,
        text: &str,
        filters: &[MemoryFilter],
        min_relevance: f32,
        limit: usize,
        with_embeddings: bool,
    ) -> AppResult<Vec<(Fragment, f32)>>;

    /// Fragments matching `filters`, in store order, without scores.
    async fn list(
        &self,
        index: &str,
        filters: &[MemoryFilter],
        limit: usize,
        with_embeddings: bool,
    ) -> AppResult<Vec<Fragment>>;

    /// Names of all indexes.
    async fn indexes(&self) -> AppResult<Vec<String>>;
}
