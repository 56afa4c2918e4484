//! Provider factory.
//!
//! Builds a text generation client from configuration values.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use std::sync::Arc;
use structrag_core::{AppError, AppResult};

/// Create a text generation client for `provider`.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `model` - Model identifier used for every call
/// * `api_key` - Optional API key (for providers that require it)
///
/// # Errors
/// Returns `AppError::Config` when the provider is unknown or misconfigured.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    model: &str,
    _api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    if model.trim().is_empty() {
        return Err(AppError::Config("Model cannot be empty".to_string()));
    }

    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or(OllamaClient::DEFAULT_URL);
            tracing::debug!("Creating Ollama client at {} for model {}", base_url, model);
            Ok(Arc::new(OllamaClient::with_base_url(base_url, model)))
        }
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}
