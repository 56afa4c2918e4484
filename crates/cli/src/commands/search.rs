//! Search command handler.

use super::{cancel_on_ctrl_c, open_client, parse_tags, print_json};
use clap::Args;
use structrag_core::config::AppConfig;
use structrag_search::SearchResult;

/// Find citations for a query without generating an answer
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Index to search
    pub index: String,

    /// Query text; when omitted, fragments are listed by tag only
    #[arg(default_value = "")]
    pub query: String,

    /// Tag filter as key=value (repeatable, all must match)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Minimum relevance of returned fragments (0.0-1.0)
    #[arg(long, default_value = "0.0")]
    pub min_relevance: f32,

    /// Maximum number of fragments (default: configured max matches)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing search command for index '{}'", self.index);

        let filters = parse_tags(&self.tags)?;
        let client = open_client(config)?;
        let cancel = cancel_on_ctrl_c();

        let result = client
            .search(
                &self.index,
                &self.query,
                &filters,
                self.min_relevance,
                self.limit,
                &cancel,
            )
            .await?;

        if self.json {
            print_json(&result)?;
        } else {
            print_result(&result);
        }

        Ok(())
    }
}

fn print_result(result: &SearchResult) {
    if result.no_result() {
        println!("No results.");
        return;
    }

    for citation in &result.results {
        println!("{} ({})", citation.source_name, citation.link);
        for partition in &citation.partitions {
            match partition.relevance {
                Some(relevance) => println!("  [{:.3}] {}", relevance, partition.text),
                None => println!("  {}", partition.text),
            }
        }
    }
}
