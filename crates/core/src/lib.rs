//! StructRAG Core Library
//!
//! Foundational utilities shared by every StructRAG crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management, including the static search configuration

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, SearchConfig};
pub use error::{AppError, AppResult};
