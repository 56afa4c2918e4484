//! Extractor: answers each sub-question against the structured knowledge.

use super::route::StructureType;
use super::structurize::StructuredKnowledge;
use super::Stage;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use structrag_core::AppResult;

/// A sub-question with the knowledge extracted for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubKnowledge {
    pub subquestion: String,
    pub knowledge: String,
}

impl SubKnowledge {
    pub fn new(subquestion: impl Into<String>, knowledge: impl Into<String>) -> Self {
        Self {
            subquestion: subquestion.into(),
            knowledge: knowledge.into(),
        }
    }
}

fn template_for(structure: StructureType) -> &'static str {
    match structure {
        StructureType::Graph => "ExtractGraph",
        StructureType::Table => "ExtractTable",
        StructureType::Algorithm => "ExtractAlgorithm",
        StructureType::Catalogue => "ExtractCatalogue",
        StructureType::Chunk => "ExtractChunk",
    }
}

async fn extract_one(
    stage: &Stage<'_>,
    template: &str,
    knowledge: &str,
    subquestion: &str,
) -> AppResult<SubKnowledge> {
    let text = stage
        .generate(template, &[("subquery", subquestion), ("kb_info", knowledge)])
        .await?;
    Ok(SubKnowledge::new(subquestion, text))
}

/// Extract knowledge for every sub-question.
///
/// With `concurrency == 1` calls run one after another. Larger values run up
/// to that many calls at once. The result is always in sub-question order.
pub async fn extract(
    stage: &Stage<'_>,
    structured: &StructuredKnowledge,
    subquestions: &[String],
    concurrency: usize,
) -> AppResult<Vec<SubKnowledge>> {
    let template = template_for(structured.structure);
    let knowledge = structured.knowledge.as_str();

    if concurrency <= 1 {
        let mut subknowledges = Vec::with_capacity(subquestions.len());
        for subquestion in subquestions {
            subknowledges.push(extract_one(stage, template, knowledge, subquestion).await?);
        }
        return Ok(subknowledges);
    }

    stream::iter(subquestions)
        .map(|subquestion| extract_one(stage, template, knowledge, subquestion))
        .buffered(concurrency)
        .try_collect()
        .await
}
