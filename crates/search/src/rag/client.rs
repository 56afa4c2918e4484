//! Search facade: the public entry point of the pipeline.

use super::citations::{cite_by_document, cite_by_file};
use super::structurize::resolve_route;
use super::{cancellable, decompose, extract, merge, route, structurize, Stage, REQUIRED_TEMPLATES};
use crate::context::RequestContext;
use crate::retriever::Retriever;
use crate::types::{Answer, Fragment, MemoryFilter, SearchResult};
use std::sync::Arc;
use structrag_core::{AppResult, SearchConfig};
use structrag_llm::LlmClient;
use structrag_prompt::TemplateStore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Structure-aware question answering over a retriever.
///
/// Holds only construction-time state, so one client can serve concurrent
/// requests without locking.
pub struct StructRagClient {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmClient>,
    templates: TemplateStore,
    config: SearchConfig,
}

impl StructRagClient {
    /// Create a client.
    ///
    /// Fails when the configuration is out of range or any pipeline
    /// template is missing or incomplete.
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmClient>,
        templates: TemplateStore,
        config: SearchConfig,
    ) -> AppResult<Self> {
        config.validate()?;
        templates.validate(REQUIRED_TEMPLATES)?;

        tracing::debug!(
            provider = llm.provider_name(),
            max_matches = config.max_matches_count,
            "Search client ready"
        );

        Ok(Self {
            retriever,
            llm,
            templates,
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Answer `question` from the fragments of `index`.
    ///
    /// Cancelling `cancel` aborts the stage in flight and returns
    /// `AppError::Cancelled`; no partial answer is produced.
    pub async fn ask(
        &self,
        index: &str,
        question: &str,
        filters: &[MemoryFilter],
        min_relevance: f32,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> AppResult<Answer> {
        let span = tracing::info_span!("ask", index = %index);
        self.run_ask(index, question, filters, min_relevance, context, cancel)
            .instrument(span)
            .await
    }

    async fn run_ask(
        &self,
        index: &str,
        question: &str,
        filters: &[MemoryFilter],
        min_relevance: f32,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> AppResult<Answer> {
        tracing::info!("Asking question: {}", question);

        let records = cancellable(
            cancel,
            self.retriever.similar(
                index,
                question,
                filters,
                min_relevance,
                self.config.max_matches_count,
                false,
            ),
        )
        .await?;

        if records.is_empty() {
            tracing::info!("No relevant fragments found");
            return Ok(Answer::no_result(question, &self.config.empty_answer));
        }

        tracing::debug!(
            "Found {} relevant fragments, max relevance: {:.3}, min relevance: {:.3}",
            records.len(),
            records.iter().map(|(_, r)| *r).fold(f32::MIN, f32::max),
            records.iter().map(|(_, r)| *r).fold(f32::MAX, f32::min),
        );

        let fragments: Vec<Fragment> = records.into_iter().map(|(f, _)| f).collect();

        let options = context.resolve(&self.config);
        let stage = Stage {
            llm: self.llm.as_ref(),
            templates: &self.templates,
            options: &options,
            cancel,
        };

        let tag = route::route(&stage, question, &fragments).await?;
        let structure = resolve_route(&tag, self.config.fallback_to_chunk)?;
        tracing::info!("Route: {}", structure);

        let structured = structurize::structurize(&stage, structure, question, &fragments).await?;
        tracing::trace!(
            "Instruction: {}\nInfo: {}",
            structured.instruction,
            structured.knowledge
        );

        let subquestions = decompose::decompose(&stage, &structured).await?;
        tracing::debug!("Decomposed into {} sub-questions", subquestions.len());
        tracing::trace!("Sub-questions:\n{}", subquestions.join("\n"));

        let subknowledges = extract::extract(
            &stage,
            &structured,
            &subquestions,
            self.config.extraction_concurrency,
        )
        .await?;
        tracing::trace!("Sub-knowledge:\n{}", merge::render_subknowledges(&subknowledges));

        let result = merge::merge(&stage, question, &subknowledges).await?;

        Ok(Answer {
            question: question.to_string(),
            result,
            no_result: false,
            relevant_sources: cite_by_document(index, &fragments),
        })
    }

    /// Find citations for `query` without generating text.
    ///
    /// A non-blank query uses similarity retrieval; otherwise `filters` are
    /// listed without scores. With a blank query and no filters at all,
    /// nothing is retrieved. A filter without conditions matches every
    /// fragment. `limit`
    /// defaults to the configured maximum matches.
    pub async fn search(
        &self,
        index: &str,
        query: &str,
        filters: &[MemoryFilter],
        min_relevance: f32,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> AppResult<SearchResult> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(self.config.max_matches_count);

        let has_query = !query.trim().is_empty();

        if !has_query && filters.is_empty() {
            tracing::warn!("No query or filters provided");
            return Ok(SearchResult::empty(query));
        }

        let fragments: Vec<(Fragment, Option<f32>)> = if has_query {
            tracing::trace!(
                "Fetching relevant fragments by similarity, min relevance {}",
                min_relevance
            );
            cancellable(
                cancel,
                self.retriever
                    .similar(index, query, filters, min_relevance, limit, false),
            )
            .await?
            .into_iter()
            .map(|(f, r)| (f, Some(r)))
            .collect()
        } else {
            tracing::trace!("Fetching fragments by filtering");
            cancellable(cancel, self.retriever.list(index, filters, limit, false))
                .await?
                .into_iter()
                .map(|f| (f, None))
                .collect()
        };

        let results = cite_by_file(index, &fragments, limit);
        if results.is_empty() {
            tracing::debug!("No fragments found");
        }

        Ok(SearchResult {
            query: query.to_string(),
            results,
        })
    }

    /// Names of the indexes the retriever knows.
    pub async fn list_indexes(&self, cancel: &CancellationToken) -> AppResult<Vec<String>> {
        cancellable(cancel, self.retriever.indexes()).await
    }
}
