//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds the configuration and a
//! fully wired `ChartgenExecutor`, making them accessible to all request
//! handlers.

use crate::config::AppConfig;
use chartgen::{
    catalog::ChartCatalog,
    executor::{ChartgenExecutor, ResolvedTask},
    providers::{
        ai::{gemini::GeminiProvider, open_ai::OpenAiProvider, AiProvider},
        db::DatalakeProvider,
    },
};
use std::{collections::HashMap, sync::Arc};

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The pipeline executor, wired with providers, tasks, backend and catalog.
    pub executor: Arc<ChartgenExecutor>,
}

/// Builds the shared application state from the configuration.
///
/// This function initializes all necessary services:
/// - It instantiates an AI provider client for each entry in the `providers`
///   section of the configuration.
/// - It resolves every task to a concrete provider and prompt pair.
/// - It sets up the datalake query backend and the chart catalog.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    // Create a map of AI provider instances from the configuration.
    let mut ai_providers: HashMap<String, Box<dyn AiProvider>> = HashMap::new();
    for (name, provider_config) in &config.providers {
        let provider: Box<dyn AiProvider> = match provider_config.provider.as_str() {
            "gemini" => {
                let api_key = provider_config.api_key.clone().ok_or_else(|| {
                    anyhow::anyhow!("api_key is required for gemini provider '{name}'")
                })?;
                // If api_url is not provided in config, construct it from the model name.
                let api_url = match provider_config.api_url.clone() {
                    Some(url) => url,
                    None => {
                        let model = provider_config.model_name.as_deref().ok_or_else(|| {
                            anyhow::anyhow!(
                                "gemini provider '{name}' needs either api_url or model_name"
                            )
                        })?;
                        format!(
                            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
                        )
                    }
                };
                Box::new(GeminiProvider::new(api_url, api_key)?)
            }
            "open_ai" => {
                // For OpenAI-compatible providers, the URL is always required.
                let api_url = provider_config.api_url.clone().ok_or_else(|| {
                    anyhow::anyhow!("api_url is required for open_ai provider '{name}'")
                })?;
                Box::new(OpenAiProvider::new(
                    api_url,
                    provider_config.api_key.clone(),
                    provider_config.model_name.clone(),
                    provider_config.max_tokens,
                )?)
            }
            _ => {
                return Err(anyhow::anyhow!(
                    "Unsupported AI provider type '{}' for provider '{}'",
                    provider_config.provider,
                    name
                ));
            }
        };
        ai_providers.insert(name.clone(), provider);
    }

    // Validate and resolve all tasks from the configuration. The config
    // loading guarantees the built-in tasks arrive fully populated, so a
    // failure here indicates a malformed config file.
    let mut resolved_tasks = HashMap::new();
    for (name, task_config) in &config.tasks {
        let provider = task_config.provider.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'provider' field")
        })?;
        let system_prompt = task_config.system_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'system_prompt' field")
        })?;
        let user_prompt = task_config.user_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'user_prompt' field")
        })?;

        resolved_tasks.insert(
            name.clone(),
            ResolvedTask {
                provider,
                system_prompt,
                user_prompt,
            },
        );
    }

    // The backend that executes queries against the datalake API.
    let backend = DatalakeProvider::new(config.datalake_base_url.clone())?;
    tracing::info!(datalake_url = %config.datalake_base_url, "Initialized datalake query backend.");

    // The chart catalog, from an override file or the built-in set.
    let catalog = match &config.charts_config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read charts config '{path}': {e}"))?;
            let value: serde_json::Value = serde_json::from_str(&content)?;
            ChartCatalog::from_json(value)?
        }
        None => ChartCatalog::default(),
    };
    tracing::info!(
        "Loaded chart catalog with {} definition(s).",
        catalog.definitions().len()
    );

    let executor = ChartgenExecutor::new(
        Arc::new(ai_providers),
        Arc::new(resolved_tasks),
        Arc::new(backend),
        Arc::new(catalog),
    );

    Ok(AppState {
        config: Arc::new(config),
        executor: Arc::new(executor),
    })
}
