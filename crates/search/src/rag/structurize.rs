//! Structurizer: rebuilds raw fragments into the routed structure.

use super::route::StructureType;
use super::Stage;
use crate::types::Fragment;
use structrag_core::AppResult;

const GRAPH_INSTRUCTION: &str = "Based on the given document, construct a graph where entities are the titles of papers and the relation is 'reference', using the given document title as the head and other paper titles as tails.";

/// Output of the structurizer.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredKnowledge {
    pub structure: StructureType,

    /// Instruction that drives the remaining stages
    pub instruction: String,

    /// The restructured text
    pub knowledge: String,
}

/// Resolve a router tag into a structure.
///
/// With `fallback_to_chunk`, unknown tags degrade to `Chunk` instead of
/// failing with `AppError::InvalidRoute`.
pub fn resolve_route(tag: &str, fallback_to_chunk: bool) -> AppResult<StructureType> {
    match tag.parse::<StructureType>() {
        Ok(structure) => Ok(structure),
        Err(err) if fallback_to_chunk => {
            tracing::warn!("{}; falling back to chunk", err);
            Ok(StructureType::Chunk)
        }
        Err(err) => Err(err),
    }
}

/// `"<source>: <text>"` per fragment, in retrieval order.
pub fn raw_content(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| format!("{}: {}", f.file_name, f.partition_text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Instruction text and template for a structure; `None` for `Chunk`.
fn construction(structure: StructureType, question: &str) -> Option<(String, &'static str)> {
    match structure {
        StructureType::Graph => Some((GRAPH_INSTRUCTION.to_string(), "ConstructGraph")),
        StructureType::Table => Some((
            format!(
                "Query is {}, please extract relevant complete tables from the document based on the attributes and keywords mentioned in the Query. Note: retain table titles and source information.",
                question
            ),
            "ConstructTable",
        )),
        StructureType::Algorithm => Some((
            format!(
                "Query is {}, please extract relevant algorithms from the document based on the Query.",
                question
            ),
            "ConstructAlgorithm",
        )),
        StructureType::Catalogue => Some((
            format!(
                "Query is {}, please extract relevant catalogues from the document based on the Query.",
                question
            ),
            "ConstructCatalogue",
        )),
        StructureType::Chunk => None,
    }
}

/// Build the structured representation for `structure`.
///
/// `Chunk` makes no generation call: the knowledge is the raw content and
/// the instruction is the question itself.
pub async fn structurize(
    stage: &Stage<'_>,
    structure: StructureType,
    question: &str,
    fragments: &[Fragment],
) -> AppResult<StructuredKnowledge> {
    let raw = raw_content(fragments);

    let Some((instruction, template)) = construction(structure, question) else {
        return Ok(StructuredKnowledge {
            structure,
            instruction: question.to_string(),
            knowledge: raw,
        });
    };

    let knowledge = stage
        .generate(template, &[("instruction", &instruction), ("raw_content", &raw)])
        .await?;

    Ok(StructuredKnowledge {
        structure,
        instruction,
        knowledge,
    })
}
