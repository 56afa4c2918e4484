//! Search domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag name -> values.
pub type TagMap = BTreeMap<String, Vec<String>>;

/// A stored partition of a source document.
///
/// Fragments are immutable once retrieved. Similarity scores travel next to
/// the fragment, never inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    /// Record identifier within the index
    pub id: String,

    /// Owning document (a document may contain several files)
    pub document_id: String,

    /// File within the document
    pub file_id: String,

    /// Human-readable source name, usually the file name
    #[serde(default)]
    pub file_name: String,

    pub partition_text: String,

    #[serde(default)]
    pub partition_number: u32,

    #[serde(default)]
    pub section_number: u32,

    #[serde(default)]
    pub tags: TagMap,

    pub last_update: DateTime<Utc>,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Link to the original web page, when the source was a URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

fn default_content_type() -> String {
    "text/plain".to_string()
}

impl Fragment {
    /// Identifier shared by all partitions of one file of one document.
    pub fn link(&self, index: &str) -> String {
        format!("{}/{}/{}", index, self.document_id, self.file_id)
    }

    /// Add a tag value.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.entry(key.into()).or_default().push(value.into());
        self
    }
}

/// Tag conditions a fragment must carry.
///
/// A fragment matches when it has every `(key, value)` pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryFilter {
    conditions: BTreeMap<String, Vec<String>>,
}

impl MemoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the tag `key` to contain `value`.
    pub fn by_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether `fragment` carries every required tag value.
    pub fn matches(&self, fragment: &Fragment) -> bool {
        self.conditions.iter().all(|(key, values)| {
            fragment
                .tags
                .get(key)
                .is_some_and(|present| values.iter().all(|v| present.contains(v)))
        })
    }

    /// Whether `fragment` satisfies a filter list.
    ///
    /// An empty list matches everything; otherwise any filter may match.
    pub fn any_matches(filters: &[MemoryFilter], fragment: &Fragment) -> bool {
        filters.is_empty() || filters.iter().any(|f| f.matches(fragment))
    }
}

/// One partition quoted by a citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    pub text: String,

    /// `None` when the fragment was listed without a similarity score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f32>,

    pub partition_number: u32,

    pub section_number: u32,

    pub last_update: DateTime<Utc>,

    pub tags: TagMap,
}

impl Partition {
    pub fn from_fragment(fragment: &Fragment, relevance: Option<f32>) -> Self {
        Self {
            text: fragment.partition_text.clone(),
            relevance,
            partition_number: fragment.partition_number,
            section_number: fragment.section_number,
            last_update: fragment.last_update,
            tags: fragment.tags.clone(),
        }
    }
}

/// Attributable record of the source partitions behind a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub index: String,

    pub document_id: String,

    pub file_id: String,

    /// `<index>/<document>/<file>`
    pub link: String,

    pub source_content_type: String,

    pub source_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    pub partitions: Vec<Partition>,
}

impl Citation {
    /// Empty citation carrying the file-level fields of `fragment`.
    pub fn for_fragment(index: &str, fragment: &Fragment) -> Self {
        Self {
            index: index.to_string(),
            document_id: fragment.document_id.clone(),
            file_id: fragment.file_id.clone(),
            link: fragment.link(index),
            source_content_type: fragment.content_type.clone(),
            source_name: fragment.file_name.clone(),
            source_url: fragment.source_url.clone(),
            partitions: Vec::new(),
        }
    }
}

/// Result of `ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question: String,

    /// Final answer text
    pub result: String,

    /// True when no relevant fragment was found
    pub no_result: bool,

    pub relevant_sources: Vec<Citation>,
}

impl Answer {
    /// Fallback answer used when retrieval finds nothing.
    pub fn no_result(question: &str, empty_answer: &str) -> Self {
        Self {
            question: question.to_string(),
            result: empty_answer.to_string(),
            no_result: true,
            relevant_sources: Vec::new(),
        }
    }
}

/// Result of `search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub query: String,

    pub results: Vec<Citation>,
}

impl SearchResult {
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            results: Vec::new(),
        }
    }

    pub fn no_result(&self) -> bool {
        self.results.is_empty()
    }
}
