//! Shared types, error model, and configuration for scrapechain.
//!
//! This crate is the foundation depended on by the other scrapechain crates.
//! It provides:
//! - [`ScrapechainError`] — the unified error type
//! - Domain types ([`StageName`], [`ArtifactSpec`], [`StageOutcome`], [`RunState`])
//! - Configuration ([`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    FetchConfig, PipelineConfig, StageConfig, StagesConfig, config_dir, config_file_path,
    init_config, init_config_in, load_config, load_config_from,
};
pub use error::{Result, ScrapechainError};
pub use types::{ArtifactSpec, RunId, RunState, SearchTerm, StageName, StageOutcome};
