//! Structure-aware RAG pipeline.
//!
//! An `ask` runs these stages strictly in order, each one waiting for the
//! previous stage's full output:
//!
//! 1. `route` picks a knowledge structure for the fragments
//! 2. `structurize` rebuilds the fragments into that structure
//! 3. `decompose` splits the question into sub-questions
//! 4. `extract` answers each sub-question against the structure
//! 5. `merge` synthesizes the final answer
//!
//! `citations` groups the retrieved fragments into citation records and
//! `client` exposes the whole pipeline as `StructRagClient`.

pub mod citations;
pub mod client;
pub mod decompose;
pub mod extract;
pub mod merge;
pub mod route;
pub mod structurize;

pub use client::StructRagClient;
pub use route::StructureType;
pub use structurize::StructuredKnowledge;

use std::future::Future;
use structrag_core::{AppError, AppResult};
use structrag_llm::{generate_text, GenerationOptions, LlmClient, LlmRequest};
use structrag_prompt::{render, TemplateRequirement, TemplateStore};
use tokio_util::sync::CancellationToken;

/// Template namespace used by every stage.
pub const NAMESPACE: &str = "StructRAG";

/// Templates the pipeline needs, with the variables each one must use.
pub const REQUIRED_TEMPLATES: &[TemplateRequirement] = &[
    TemplateRequirement { namespace: NAMESPACE, name: "Route", variables: &["query", "titles"] },
    TemplateRequirement { namespace: NAMESPACE, name: "ConstructGraph", variables: &["instruction", "raw_content"] },
    TemplateRequirement { namespace: NAMESPACE, name: "ConstructTable", variables: &["instruction", "raw_content"] },
    TemplateRequirement { namespace: NAMESPACE, name: "ConstructAlgorithm", variables: &["instruction", "raw_content"] },
    TemplateRequirement { namespace: NAMESPACE, name: "ConstructCatalogue", variables: &["instruction", "raw_content"] },
    TemplateRequirement { namespace: NAMESPACE, name: "Decompose", variables: &["query", "kb_info"] },
    TemplateRequirement { namespace: NAMESPACE, name: "ExtractGraph", variables: &["subquery", "kb_info"] },
    TemplateRequirement { namespace: NAMESPACE, name: "ExtractTable", variables: &["subquery", "kb_info"] },
    TemplateRequirement { namespace: NAMESPACE, name: "ExtractAlgorithm", variables: &["subquery", "kb_info"] },
    TemplateRequirement { namespace: NAMESPACE, name: "ExtractCatalogue", variables: &["subquery", "kb_info"] },
    TemplateRequirement { namespace: NAMESPACE, name: "ExtractChunk", variables: &["subquery", "kb_info"] },
    TemplateRequirement { namespace: NAMESPACE, name: "Merge", variables: &["query", "subknowledges"] },
];

/// Everything a stage needs to run one generation.
///
/// Built once per request; holds only borrowed, read-only state.
#[derive(Clone, Copy)]
pub struct Stage<'a> {
    pub llm: &'a dyn LlmClient,
    pub templates: &'a TemplateStore,
    pub options: &'a GenerationOptions,
    pub cancel: &'a CancellationToken,
}

impl<'a> Stage<'a> {
    /// Render `name` with `variables` and generate the full response.
    pub async fn generate(&self, name: &str, variables: &[(&str, &str)]) -> AppResult<String> {
        let template = self.templates.get(NAMESPACE, name)?;
        let prompt = render(template, variables);
        let request = LlmRequest::new(prompt).with_options(self.options.clone());
        generate_text(self.llm, &request, self.cancel).await
    }
}

/// Await `future` unless `cancel` fires first.
pub async fn cancellable<T, F>(cancel: &CancellationToken, future: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = future => result,
    }
}
