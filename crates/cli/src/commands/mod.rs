//! Command handlers for the StructRAG CLI.

pub mod ask;
pub mod indexes;
pub mod search;
pub mod templates;

pub use ask::AskCommand;
pub use indexes::IndexesCommand;
pub use search::SearchCommand;
pub use templates::TemplatesCommand;

use anyhow::Context;
use std::sync::Arc;
use structrag_core::{config::AppConfig, AppError, AppResult};
use structrag_llm::create_client;
use structrag_prompt::TemplateStore;
use structrag_search::{MemoryFilter, SnapshotRetriever, StructRagClient};
use tokio_util::sync::CancellationToken;

/// Build a search client from the workspace templates and snapshots.
pub(crate) fn open_client(config: &AppConfig) -> anyhow::Result<StructRagClient> {
    let templates_dir = config.templates_path();
    let templates = TemplateStore::load_dir(&templates_dir)
        .with_context(|| format!("Failed to load templates from {:?}", templates_dir))?;

    let data_dir = config.data_path();
    let retriever = SnapshotRetriever::load_dir(&data_dir)
        .with_context(|| format!("Failed to load snapshots from {:?}", data_dir))?;

    let llm = create_client(
        &config.provider,
        config.endpoint.as_deref(),
        &config.model,
        config.api_key.as_deref(),
    )?;

    let client = StructRagClient::new(Arc::new(retriever), llm, templates, config.search.clone())?;
    Ok(client)
}

/// Turn `key=value` arguments into a single filter requiring every tag.
pub(crate) fn parse_tags(tags: &[String]) -> AppResult<Vec<MemoryFilter>> {
    if tags.is_empty() {
        return Ok(Vec::new());
    }

    let mut filter = MemoryFilter::new();
    for tag in tags {
        let (key, value) = tag
            .split_once('=')
            .filter(|(k, _)| !k.trim().is_empty())
            .ok_or_else(|| AppError::Config(format!("Invalid tag '{}', expected key=value", tag)))?;
        filter = filter.by_tag(key.trim(), value.trim());
    }

    Ok(vec![filter])
}

/// Token cancelled on the first Ctrl-C.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling request");
            token.cancel();
        }
    });
    cancel
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
