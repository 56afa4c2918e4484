//! Local retriever over JSON fragment snapshots.
//!
//! Each `<dir>/<index>.json` file holds the fragments of one index. Scores
//! are lexical: the share of distinct query terms found in a partition.

use crate::retriever::Retriever;
use crate::types::{Fragment, MemoryFilter};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use structrag_core::{AppError, AppResult};

/// Read-only retriever backed by in-memory snapshots.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRetriever {
    indexes: BTreeMap<String, Vec<Fragment>>,
}

impl SnapshotRetriever {
    /// Build a retriever from fragments grouped by index name.
    pub fn new(indexes: BTreeMap<String, Vec<Fragment>>) -> Self {
        Self { indexes }
    }

    /// Load every `*.json` snapshot in `dir`.
    pub fn load_dir(dir: &Path) -> AppResult<Self> {
        if !dir.is_dir() {
            return Err(AppError::Retrieval(format!(
                "Snapshot directory not found: {:?}",
                dir
            )));
        }

        let mut indexes = BTreeMap::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let contents = std::fs::read_to_string(&path)?;
            let fragments: Vec<Fragment> = serde_json::from_str(&contents).map_err(|e| {
                AppError::Retrieval(format!("Failed to parse snapshot {:?}: {}", path, e))
            })?;

            tracing::debug!("Loaded index '{}' with {} fragments", name, fragments.len());
            indexes.insert(name.to_string(), fragments);
        }

        Ok(Self { indexes })
    }

    fn fragments(&self, index: &str) -> &[Fragment] {
        match self.indexes.get(index) {
            Some(fragments) => fragments,
            None => {
                tracing::debug!("Index '{}' not found", index);
                &[]
            }
        }
    }
}

fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Share of distinct query terms present in `text`, in `[0, 1]`.
fn overlap_score(query_terms: &BTreeSet<String>, text: &str) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let text_terms = terms(text);
    let hits = query_terms.iter().filter(|t| text_terms.contains(*t)).count();
    hits as f32 / query_terms.len() as f32
}

#[async_trait::async_trait]
impl Retriever for SnapshotRetriever {
    async fn similar(
        &self,
        index: &str,
        text: &str,
        filters: &[MemoryFilter],
        min_relevance: f32,
        limit: usize,
        _with_embeddings: bool,
    ) -> AppResult<Vec<(Fragment, f32)>> {
        let query_terms = terms(text);

        let mut scored: Vec<(Fragment, f32)> = self
            .fragments(index)
            .iter()
            .filter(|f| MemoryFilter::any_matches(filters, f))
            .map(|f| (f.clone(), overlap_score(&query_terms, &f.partition_text)))
            .filter(|(_, score)| *score > 0.0 && *score >= min_relevance)
            .collect();

        // Stable sort keeps snapshot order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        Ok(scored)
    }

    async fn list(
        &self,
        index: &str,
        filters: &[MemoryFilter],
        limit: usize,
        _with_embeddings: bool,
    ) -> AppResult<Vec<Fragment>> {
        Ok(self
            .fragments(index)
            .iter()
            .filter(|f| MemoryFilter::any_matches(filters, f))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn indexes(&self) -> AppResult<Vec<String>> {
        Ok(self.indexes.keys().cloned().collect())
    }
}
