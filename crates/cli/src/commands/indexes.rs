//! Indexes command handler.

use super::{open_client, print_json};
use clap::Args;
use structrag_core::config::AppConfig;
use tokio_util::sync::CancellationToken;

/// List the available indexes
#[derive(Args, Debug)]
pub struct IndexesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexesCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing indexes command");

        let client = open_client(config)?;
        let indexes = client.list_indexes(&CancellationToken::new()).await?;

        if self.json {
            print_json(&serde_json::json!({ "indexes": indexes }))?;
        } else if indexes.is_empty() {
            println!("No indexes found in {:?}", config.data_path());
        } else {
            for index in &indexes {
                println!("{}", index);
            }
        }

        Ok(())
    }
}
