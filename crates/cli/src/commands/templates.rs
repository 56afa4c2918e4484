//! Templates command handler.
//!
//! Lists the templates found under the templates directory and reports any
//! pipeline template that is missing or lacks one of its variables.

use super::print_json;
use anyhow::Context;
use clap::Args;
use structrag_core::config::AppConfig;
use structrag_prompt::TemplateStore;
use structrag_search::REQUIRED_TEMPLATES;

/// List and validate the loaded prompt templates
#[derive(Args, Debug)]
pub struct TemplatesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl TemplatesCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let dir = config.templates_path();
        tracing::info!("Executing templates command for {:?}", dir);

        let store = TemplateStore::load_dir(&dir)
            .with_context(|| format!("Failed to load templates from {:?}", dir))?;
        let names: Vec<String> = store.keys().map(|k| k.to_string()).collect();
        let validation = store.validate(REQUIRED_TEMPLATES);

        if self.json {
            print_json(&serde_json::json!({
                "directory": dir,
                "templates": names,
                "valid": validation.is_ok(),
                "error": validation.as_ref().err().map(|e| e.to_string()),
            }))?;
        } else {
            println!("Templates in {:?}:", dir);
            for name in &names {
                println!("- {}", name);
            }
            match &validation {
                Ok(()) => println!("All {} pipeline templates are valid.", REQUIRED_TEMPLATES.len()),
                Err(e) => println!("Invalid: {}", e),
            }
        }

        validation?;
        Ok(())
    }
}
