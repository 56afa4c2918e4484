//! Prompt template types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a template by namespace and name (e.g., `StructRAG/Route`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateKey {
    pub namespace: String,
    pub name: String,
}

impl TemplateKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A template that must be present, with the variables it must reference.
#[derive(Debug, Clone, Copy)]
pub struct TemplateRequirement {
    pub namespace: &'static str,
    pub name: &'static str,
    pub variables: &'static [&'static str],
}

impl TemplateRequirement {
    pub fn key(&self) -> TemplateKey {
        TemplateKey::new(self.namespace, self.name)
    }
}

/// Marker for a template variable, e.g. `{{$query}}`.
pub fn marker(variable: &str) -> String {
    format!("{{{{${}}}}}", variable)
}
