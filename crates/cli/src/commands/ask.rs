//! Ask command handler.
//!
//! Runs the full pipeline and prints the answer with its sources.

use super::{cancel_on_ctrl_c, open_client, parse_tags, print_json};
use clap::Args;
use structrag_core::config::AppConfig;
use structrag_search::{Answer, RequestContext};

/// Answer a question from an index
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Index to query
    pub index: String,

    /// The question to answer
    pub question: String,

    /// Tag filter as key=value (repeatable, all must match)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Minimum relevance of retrieved fragments (0.0-1.0)
    #[arg(long, default_value = "0.0")]
    pub min_relevance: f32,

    /// Maximum tokens in each generated response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Nucleus sampling probability (0.0-1.0)
    #[arg(long)]
    pub top_p: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command for index '{}'", self.index);
        tracing::debug!("Ask command options: {:?}", self);

        let filters = parse_tags(&self.tags)?;
        let client = open_client(config)?;
        let context = self.request_context();
        let cancel = cancel_on_ctrl_c();

        let answer = client
            .ask(
                &self.index,
                &self.question,
                &filters,
                self.min_relevance,
                &context,
                &cancel,
            )
            .await?;

        if self.json {
            print_json(&answer)?;
        } else {
            print_answer(&answer);
        }

        Ok(())
    }

    fn request_context(&self) -> RequestContext {
        let mut context = RequestContext::new();
        if let Some(max_tokens) = self.max_tokens {
            context = context.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            context = context.with_temperature(temperature);
        }
        if let Some(top_p) = self.top_p {
            context = context.with_top_p(top_p);
        }
        context
    }
}

fn print_answer(answer: &Answer) {
    println!("Answer:");
    println!("{}", answer.result);

    if answer.no_result {
        return;
    }

    println!();
    if answer.relevant_sources.is_empty() {
        println!("Sources: (no sources available)");
    } else {
        println!("Sources:");
        for citation in &answer.relevant_sources {
            println!("- {} ({})", citation.source_name, citation.link);
        }
    }
}
