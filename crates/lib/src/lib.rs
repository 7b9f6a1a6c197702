//! # Natural Language to Charts
//!
//! This crate turns natural language prompts into rendered-ready charts
//! over a tabular dataset. It profiles the dataset's schema, asks a
//! configurable AI provider to suggest charts grounded in that schema,
//! builds normalized query specifications for each suggestion, executes
//! them against a job-based query backend, and reshapes the results for a
//! dashboard renderer. Every generative stage has a deterministic fallback
//! so a prompt always produces an answer.

pub mod builder;
pub mod catalog;
pub mod constants;
pub mod errors;
pub mod executor;
pub mod extract;
pub mod profile;
pub mod prompts;
pub mod providers;
pub mod reshape;
pub mod suggest;

pub use builder::{BuildResponse, BuiltChart, QuerySpec};
pub use catalog::ChartCatalog;
pub use errors::ChartgenError;
pub use executor::{ChartgenExecutor, ResolvedTask};
pub use profile::SchemaProfile;
pub use reshape::ChartData;
pub use suggest::PromptSuggestions;
