//! Merger: synthesizes sub-answers into the final answer.

use super::extract::SubKnowledge;
use super::Stage;
use structrag_core::AppResult;

/// Render the sub-answers in sub-question order.
pub fn render_subknowledges(subknowledges: &[SubKnowledge]) -> String {
    subknowledges
        .iter()
        .map(|s| {
            format!(
                "Subquery: {}\nRetrieval results:\n{}\n\n",
                s.subquestion, s.knowledge
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate the final answer text.
pub async fn merge(
    stage: &Stage<'_>,
    question: &str,
    subknowledges: &[SubKnowledge],
) -> AppResult<String> {
    let rendered = render_subknowledges(subknowledges);
    stage
        .generate("Merge", &[("query", question), ("subknowledges", &rendered)])
        .await
}
