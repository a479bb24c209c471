//! Shared types, error model, and configuration for arxivdigest.
//!
//! This crate is the foundation depended on by all other arxivdigest crates.
//! It provides:
//! - [`ArxivDigestError`] — the unified error type
//! - Domain types ([`PaperRecord`], [`PaperMeta`], [`Digest`], [`EnhancedPaper`])
//! - Configuration ([`AppConfig`], config loading, category resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CATEGORIES_ENV, DefaultsConfig, LlmConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, parse_categories, resolve_categories,
    validate_api_key,
};
pub use error::{ArxivDigestError, Result};
pub use types::{Digest, EnhancedPaper, PaperMeta, PaperRecord};
