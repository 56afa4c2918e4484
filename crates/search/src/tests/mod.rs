//! Shared fixtures and end-to-end pipeline tests.

mod pipeline;

use crate::retriever::Retriever;
use crate::snapshot::SnapshotRetriever;
use crate::types::{Fragment, MemoryFilter, TagMap};
use crate::REQUIRED_TEMPLATES;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use structrag_core::AppResult;
use structrag_prompt::{marker, TemplateStore};

/// Fragment with fixed metadata.
pub(crate) fn fragment(document_id: &str, file_id: &str, file_name: &str, text: &str) -> Fragment {
    Fragment {
        id: format!("{}-{}-{}", document_id, file_id, text.len()),
        document_id: document_id.to_string(),
        file_id: file_id.to_string(),
        file_name: file_name.to_string(),
        partition_text: text.to_string(),
        partition_number: 0,
        section_number: 0,
        tags: TagMap::new(),
        last_update: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        content_type: "text/plain".to_string(),
        source_url: None,
    }
}

/// Templates whose first line is the template name, followed by one
/// `variable=value` line per marker.
pub(crate) fn test_templates() -> TemplateStore {
    TemplateStore::from_entries(REQUIRED_TEMPLATES.iter().map(|r| {
        let mut text = r.name.to_string();
        for variable in r.variables {
            text.push_str(&format!("\n{}={}", variable, marker(variable)));
        }
        (r.namespace, r.name, text)
    }))
}

/// Retriever wrapper counting calls per operation.
#[derive(Default)]
pub(crate) struct CountingRetriever {
    pub inner: SnapshotRetriever,
    pub similar_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl CountingRetriever {
    pub fn new(index: &str, fragments: Vec<Fragment>) -> Self {
        let mut indexes = BTreeMap::new();
        indexes.insert(index.to_string(), fragments);
        Self {
            inner: SnapshotRetriever::new(indexes),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.similar_calls.load(Ordering::SeqCst) + self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Retriever for CountingRetriever {
    async fn similar(
        &self,
        index: &str,
        text: &str,
        filters: &[MemoryFilter],
        min_relevance: f32,
        limit: usize,
        with_embeddings: bool,
    ) -> AppResult<Vec<(Fragment, f32)>> {
        self.similar_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .similar(index, text, filters, min_relevance, limit, with_embeddings)
            .await
    }

    async fn list(
        &self,
        index: &str,
        filters: &[MemoryFilter],
        limit: usize,
        with_embeddings: bool,
    ) -> AppResult<Vec<Fragment>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list(index, filters, limit, with_embeddings).await
    }

    async fn indexes(&self) -> AppResult<Vec<String>> {
        self.inner.indexes().await
    }
}
