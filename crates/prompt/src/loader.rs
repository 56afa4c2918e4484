//! Template store: loads `<root>/<namespace>/<name>.txt` files once and
//! serves them by key.

use crate::types::{marker, TemplateKey, TemplateRequirement};
use std::collections::BTreeMap;
use std::path::Path;
use structrag_core::{AppError, AppResult};

const TEMPLATE_EXTENSION: &str = "txt";

/// Immutable collection of prompt templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: BTreeMap<TemplateKey, String>,
}

impl TemplateStore {
    /// Load every template below `root`.
    ///
    /// Each `<root>/<namespace>/<name>.txt` file becomes the template
    /// `namespace/name`. Files at other depths are ignored.
    ///
    /// # Example
    /// ```no_run
    /// use structrag_prompt::TemplateStore;
    /// use std::path::Path;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = TemplateStore::load_dir(Path::new("prompts"))?;
    /// println!("{}", store.get("StructRAG", "Route")?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_dir(root: &Path) -> AppResult<Self> {
        tracing::debug!("Loading prompt templates from: {:?}", root);

        if !root.is_dir() {
            return Err(AppError::Prompt(format!(
                "Template directory not found: {:?}",
                root
            )));
        }

        let mut templates = BTreeMap::new();

        for entry in walkdir::WalkDir::new(root)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = entry.map_err(|e| {
                AppError::Prompt(format!("Failed to walk template directory {:?}: {}", root, e))
            })?;
            let path = entry.path();

            if !path.is_file()
                || path.extension().and_then(|s| s.to_str()) != Some(TEMPLATE_EXTENSION)
            {
                continue;
            }

            let namespace = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|s| s.to_str());
            let name = path.file_stem().and_then(|s| s.to_str());

            let (Some(namespace), Some(name)) = (namespace, name) else {
                tracing::warn!("Skipping template with non UTF-8 path: {:?}", path);
                continue;
            };

            let text = std::fs::read_to_string(path).map_err(|e| {
                AppError::Prompt(format!("Failed to read template {:?}: {}", path, e))
            })?;

            templates.insert(TemplateKey::new(namespace, name), text);
        }

        tracing::info!("Loaded {} prompt templates from {:?}", templates.len(), root);

        Ok(Self { templates })
    }

    /// Build a store from in-memory entries.
    pub fn from_entries<I, N, M, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, M, T)>,
        N: Into<String>,
        M: Into<String>,
        T: Into<String>,
    {
        let templates = entries
            .into_iter()
            .map(|(namespace, name, text)| (TemplateKey::new(namespace, name), text.into()))
            .collect();

        Self { templates }
    }

    /// Literal template text for `namespace/name`.
    pub fn get(&self, namespace: &str, name: &str) -> AppResult<&str> {
        self.templates
            .get(&TemplateKey::new(namespace, name))
            .map(String::as_str)
            .ok_or_else(|| {
                AppError::Prompt(format!("Prompt template not found: {}/{}", namespace, name))
            })
    }

    /// All template keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &TemplateKey> {
        self.templates.keys()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Check that every requirement is present and references its variables.
    ///
    /// All problems are reported in a single error.
    pub fn validate(&self, requirements: &[TemplateRequirement]) -> AppResult<()> {
        let mut problems = Vec::new();

        for requirement in requirements {
            let key = requirement.key();
            match self.templates.get(&key) {
                None => problems.push(format!("missing template {}", key)),
                Some(text) => {
                    for variable in requirement.variables {
                        if !text.contains(&marker(variable)) {
                            problems.push(format!(
                                "template {} does not reference {}",
                                key,
                                marker(variable)
                            ));
                        }
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Prompt(format!(
                "Invalid prompt templates: {}",
                problems.join("; ")
            )))
        }
    }
}
