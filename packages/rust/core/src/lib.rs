//! Core pipeline orchestration for scrapechain.
//!
//! This crate turns a [`scrapechain_shared::PipelineConfig`] into a validated
//! [`plan::PipelinePlan`] and drives its four external stages in order,
//! stopping at the first one that fails.

pub mod executor;
pub mod pipeline;
pub mod plan;
pub mod prompt;

pub use executor::{ProcessExecutor, StageExecutor};
pub use pipeline::{Pipeline, RunReport, StageRecord};
pub use plan::{PipelinePlan, StageInvocation, StageSpec};
pub use prompt::{PROMPT, read_search_term};
