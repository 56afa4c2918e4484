//! Decomposer: splits a question into ordered sub-questions.

use super::structurize::StructuredKnowledge;
use super::Stage;
use structrag_core::AppResult;

/// Non-blank lines of `text`, trimmed, in order.
///
/// Duplicates are kept and the count is not capped.
pub fn split_subquestions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Generate the sub-questions for the structured knowledge.
pub async fn decompose(stage: &Stage<'_>, structured: &StructuredKnowledge) -> AppResult<Vec<String>> {
    let text = stage
        .generate(
            "Decompose",
            &[
                ("query", &structured.instruction),
                ("kb_info", &structured.knowledge),
            ],
        )
        .await?;

    Ok(split_subquestions(&text))
}
