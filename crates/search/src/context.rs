//! Per-request generation overrides.

use serde::{Deserialize, Serialize};
use structrag_core::SearchConfig;
use structrag_llm::GenerationOptions;

/// Overrides a caller may attach to a single `ask`.
///
/// Only the answer length, temperature and nucleus sampling can change per
/// request; penalties, stop sequences and token biases always come from the
/// static configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Merge the overrides over the static defaults.
    pub fn resolve(&self, config: &SearchConfig) -> GenerationOptions {
        let mut options = GenerationOptions::from_config(config);

        if let Some(max_tokens) = self.max_tokens {
            options.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            options.temperature = temperature;
        }
        if let Some(top_p) = self.top_p {
            options.top_p = top_p;
        }

        options
    }
}
