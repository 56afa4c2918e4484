//! Router: picks the knowledge structure for a question.

use super::Stage;
use crate::types::Fragment;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use structrag_core::{AppError, AppResult};

/// The closed set of knowledge structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureType {
    Graph,
    Table,
    Algorithm,
    Catalogue,
    Chunk,
}

impl StructureType {
    pub const ALL: [StructureType; 5] = [
        StructureType::Graph,
        StructureType::Table,
        StructureType::Algorithm,
        StructureType::Catalogue,
        StructureType::Chunk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Table => "table",
            Self::Algorithm => "algorithm",
            Self::Catalogue => "catalogue",
            Self::Chunk => "chunk",
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StructureType {
    type Err = AppError;

    /// Parse a route tag, ignoring surrounding whitespace and case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = normalize(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or(AppError::InvalidRoute(tag))
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Space-separated source names, one per distinct document.
pub fn titles(fragments: &[Fragment]) -> String {
    let mut seen = HashSet::new();
    fragments
        .iter()
        .filter(|f| seen.insert(f.document_id.as_str()))
        .map(|f| f.file_name.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ask the model which structure fits the question and fragments.
///
/// Returns the normalized tag. It is not checked against the supported
/// set here; `structurize` does that when it dispatches.
pub async fn route(stage: &Stage<'_>, question: &str, fragments: &[Fragment]) -> AppResult<String> {
    let titles = titles(fragments);
    let text = stage
        .generate("Route", &[("query", question), ("titles", &titles)])
        .await?;

    Ok(normalize(&text))
}
