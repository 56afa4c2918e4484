//! Configuration management for StructRAG.
//!
//! Configuration is merged from several sources, later sources winning:
//! - Built-in defaults
//! - Config file (`.structrag/config.yaml` or `STRUCTRAG_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! `SearchConfig` is the immutable, construction-time configuration of the
//! search facade. Nothing in it changes per request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .structrag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Text generation provider (e.g., "ollama")
    pub provider: String,

    /// Model identifier passed to the provider
    pub model: String,

    /// Optional provider endpoint override
    pub endpoint: Option<String>,

    /// API key for providers that need one
    pub api_key: Option<String>,

    /// Directory holding `<namespace>/<name>.txt` prompt templates
    pub templates_dir: Option<PathBuf>,

    /// Directory holding `<index>.json` fragment snapshots
    pub data_dir: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Emit JSON log lines
    pub log_json: bool,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Search pipeline settings
    pub search: SearchConfig,
}

/// Static configuration of the search pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Maximum fragments retrieved for `ask`, and the default `search` limit
    pub max_matches_count: usize,

    /// Default maximum tokens per generation call
    pub answer_tokens: u32,

    /// Answer text returned when no fragment is relevant
    pub empty_answer: String,

    /// Default sampling temperature
    pub temperature: f32,

    /// Default nucleus sampling probability
    pub top_p: f32,

    pub presence_penalty: f32,

    pub frequency_penalty: f32,

    pub stop_sequences: Vec<String>,

    /// Token id -> bias
    pub token_selection_biases: HashMap<i32, f32>,

    /// Parallel sub-question extractions; 1 keeps them strictly sequential
    pub extraction_concurrency: usize,

    /// Treat an unrecognized route as `chunk` instead of failing
    pub fallback_to_chunk: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_matches_count: 100,
            answer_tokens: 300,
            empty_answer: "INFO NOT FOUND".to_string(),
            temperature: 0.0,
            top_p: 0.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            stop_sequences: Vec::new(),
            token_selection_biases: HashMap::new(),
            extraction_concurrency: 1,
            fallback_to_chunk: false,
        }
    }
}

impl SearchConfig {
    /// Check that every value is within its accepted range.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_matches_count == 0 {
            return Err(AppError::Config(
                "maxMatchesCount must be greater than zero".to_string(),
            ));
        }

        if self.answer_tokens == 0 {
            return Err(AppError::Config(
                "answerTokens must be greater than zero".to_string(),
            ));
        }

        if self.empty_answer.trim().is_empty() {
            return Err(AppError::Config("emptyAnswer cannot be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(AppError::Config(format!(
                "topP must be between 0 and 1, got {}",
                self.top_p
            )));
        }

        for (name, value) in [
            ("presencePenalty", self.presence_penalty),
            ("frequencyPenalty", self.frequency_penalty),
        ] {
            if !(-2.0..=2.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "{} must be between -2 and 2, got {}",
                    name, value
                )));
            }
        }

        if self.extraction_concurrency == 0 {
            return Err(AppError::Config(
                "extractionConcurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    paths: Option<PathsSection>,
    logging: Option<LoggingSection>,
    search: Option<SearchConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PathsSection {
    workspace: Option<String>,
    templates: Option<String>,
    data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            templates_dir: None,
            data_dir: None,
            log_level: None,
            log_json: false,
            verbose: false,
            no_color: false,
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment.
    ///
    /// Environment variables:
    /// - `STRUCTRAG_WORKSPACE`: Override workspace path
    /// - `STRUCTRAG_CONFIG`: Path to config file
    /// - `STRUCTRAG_PROVIDER`: Generation provider
    /// - `STRUCTRAG_MODEL`: Model identifier
    /// - `STRUCTRAG_ENDPOINT`: Provider endpoint
    /// - `STRUCTRAG_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use structrag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `STRUCTRAG_WORKSPACE` and `STRUCTRAG_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        } else if let Ok(workspace) = std::env::var("STRUCTRAG_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        } else if let Ok(config_file) = std::env::var("STRUCTRAG_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.workspace.join(".structrag/config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("STRUCTRAG_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("STRUCTRAG_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("STRUCTRAG_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Ok(key) = std::env::var("STRUCTRAG_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.merge(config_file))
    }

    fn merge(&self, config_file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(paths) = config_file.paths {
            if let Some(workspace) = paths.workspace {
                result.workspace = PathBuf::from(workspace);
            }
            if let Some(templates) = paths.templates {
                result.templates_dir = Some(PathBuf::from(templates));
            }
            if let Some(data) = paths.data {
                result.data_dir = Some(PathBuf::from(data));
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
            if let Some(env_var) = llm.api_key_env {
                if let Ok(key) = std::env::var(&env_var) {
                    result.api_key = Some(key);
                }
            }
        }

        if let Some(search) = config_file.search {
            result.search = search;
        }

        result
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        endpoint: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(endpoint) = endpoint {
            self.endpoint = Some(endpoint);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Directory containing prompt templates.
    pub fn templates_path(&self) -> PathBuf {
        match self.templates_dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => self.workspace.join(dir),
            None => self.workspace.join("prompts"),
        }
    }

    /// Directory containing fragment snapshots.
    pub fn data_path(&self) -> PathBuf {
        match self.data_dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => self.workspace.join(dir),
            None => self.workspace.join(".structrag/indexes"),
        }
    }

    /// Validate configuration before any component is built.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama"];

        if !known_providers.contains(&self.provider.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AppError::Config("Model cannot be empty".to_string()));
        }

        self.search.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert!(!config.verbose);
        assert_eq!(config.search.max_matches_count, 100);
        assert_eq!(config.search.empty_answer, "INFO NOT FOUND");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_paths() {
        let config = AppConfig::default();
        assert!(config.templates_path().ends_with("prompts"));
        assert!(config.data_path().ends_with(".structrag/indexes"));
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            None,
            Some("ollama".to_string()),
            Some("qwen2.5".to_string()),
            Some("http://localhost:8080".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.model, "qwen2.5");
        assert_eq!(overridden.endpoint.as_deref(), Some("http://localhost:8080"));
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_config_ranges() {
        let mut search = SearchConfig::default();
        search.temperature = 2.5;
        assert!(search.validate().is_err());

        let mut search = SearchConfig::default();
        search.top_p = -0.1;
        assert!(search.validate().is_err());

        let mut search = SearchConfig::default();
        search.max_matches_count = 0;
        assert!(search.validate().is_err());

        let mut search = SearchConfig::default();
        search.extraction_concurrency = 0;
        assert!(search.validate().is_err());

        let mut search = SearchConfig::default();
        search.empty_answer = "  ".to_string();
        assert!(search.validate().is_err());
    }

    #[test]
    fn test_merge_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  provider: ollama
  model: mistral
  endpoint: http://gpu-box:11434
paths:
  templates: custom-prompts
logging:
  level: warn
  color: false
search:
  maxMatchesCount: 20
  answerTokens: 4096
  emptyAnswer: "Nothing relevant."
"#,
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.model, "mistral");
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert!(config.templates_path().ends_with("custom-prompts"));
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert!(config.no_color);
        assert_eq!(config.search.max_matches_count, 20);
        assert_eq!(config.search.answer_tokens, 4096);
        assert_eq!(config.search.empty_answer, "Nothing relevant.");
        // Unspecified fields keep their defaults
        assert_eq!(config.search.extraction_concurrency, 1);
    }

    #[test]
    fn test_load_from_explicit_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(".structrag");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "search:\n  maxMatchesCount: 7\n").unwrap();

        let config = AppConfig::load_from(Some(temp_dir.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp_dir.path());
        assert_eq!(config.search.max_matches_count, 7);
    }

    #[test]
    fn test_load_from_missing_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(AppConfig::load_from(Some(missing), None).is_err());
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "search: [").unwrap();
        assert!(AppConfig::default().merge_yaml(&path).is_err());
    }
}
