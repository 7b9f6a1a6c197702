pub mod gemini;
pub mod open_ai;

use crate::errors::ChartgenError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with a generative AI provider.
///
/// This trait defines a common interface for turning a prompt pair into raw
/// model text. Callers never assume the output is well-formed: cleanup and
/// validation happen downstream, and fallback paths exist for output that
/// cannot be salvaged.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    ///
    /// The result is the raw text of the model's reply, before any JSON
    /// extraction.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, ChartgenError>;
}

dyn_clone::clone_trait_object!(AiProvider);
