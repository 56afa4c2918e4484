//! Prompt templates for StructRAG.
//!
//! - Templates are plain text files loaded once at startup
//! - Lookup by `(namespace, name)`
//! - Startup validation of required templates and their variables
//! - `{{$variable}}` substitution

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::render;
pub use loader::TemplateStore;
pub use types::{marker, TemplateKey, TemplateRequirement};
