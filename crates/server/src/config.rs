//! # Application Configuration
//!
//! This module defines the configuration structure for the `chartgen-server`
//! and provides the logic for loading it from a `config.yml` file and
//! environment variables. This approach allows for a structured, flexible,
//! and maintainable configuration setup.

use chartgen::executor::{TASK_CHART_SUGGESTION, TASK_QUERY_BUILD};
use chartgen::prompts::{
    QUERY_BUILD_SYSTEM_PROMPT, QUERY_BUILD_USER_PROMPT, SUGGESTION_SYSTEM_PROMPT,
    SUGGESTION_USER_PROMPT,
};
use config::{
    Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue,
    ValueKind as ConfigValueKind,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL of the datalake query API, e.g. `http://host:8080/api/v1`.
    #[serde(default = "default_datalake_base_url")]
    pub datalake_base_url: String,
    /// Origins allowed by the CORS layer.
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
    /// Optional path to a JSON file overriding the built-in chart catalog.
    #[serde(default)]
    pub charts_config_path: Option<String>,
    /// A map of named, reusable AI provider configurations.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// A map of tasks, each specifying a provider and prompts.
    #[serde(default)]
    pub tasks: HashMap<String, TaskConfig>,
}

/// Provides a default value for the `port` field if not set in the environment.
fn default_port() -> u16 {
    8000
}

/// Provides a default value for the `datalake_base_url` field.
fn default_datalake_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

/// The dashboard dev-server origins allowed when none are configured.
fn default_cors_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:3001".to_string(),
    ]
}

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider (`"open_ai"` or `"gemini"`).
    pub provider: String,
    /// The API URL. Optional for Gemini where it can be derived from the model.
    pub api_url: Option<String>,
    /// The API key, which can be null for unauthenticated local endpoints.
    pub api_key: Option<String>,
    /// The model to request. Optional for endpoints serving a single model.
    pub model_name: Option<String>,
    /// Completion token cap forwarded to OpenAI-compatible endpoints.
    pub max_tokens: Option<u32>,
}

/// Defines the prompts and provider for a specific pipeline task.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// Constructs a `config::Value` map of the default, hardcoded tasks from the
/// library. This serves as the base layer of configuration.
fn build_default_tasks() -> HashMap<String, ConfigValue> {
    let tasks = vec![
        (
            TASK_CHART_SUGGESTION,
            ("default", SUGGESTION_SYSTEM_PROMPT, SUGGESTION_USER_PROMPT),
        ),
        (
            TASK_QUERY_BUILD,
            ("default", QUERY_BUILD_SYSTEM_PROMPT, QUERY_BUILD_USER_PROMPT),
        ),
    ];

    tasks
        .into_iter()
        .map(|(name, (provider, sys, user))| {
            let mut table = HashMap::new();
            table.insert("provider".to_string(), ConfigValue::from(provider));
            table.insert("system_prompt".to_string(), ConfigValue::from(sys));
            table.insert("user_prompt".to_string(), ConfigValue::from(user));
            (
                name.to_string(),
                ConfigValue::new(None, ConfigValueKind::Table(table)),
            )
        })
        .collect()
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").unwrap();
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_else(|_| "".to_string())
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// Layering, lowest to highest precedence: the library's built-in task
/// prompts, the YAML file (with `${VAR}` environment substitution), plain
/// environment variables for top-level keys like `PORT`, then
/// `CHARTGEN_`-prefixed variables for nested overrides
/// (e.g. `CHARTGEN_PROVIDERS__DEFAULT__API_KEY`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults from the library.
        .set_default("tasks", build_default_tasks())?;

    // Layer 2: Main config file.
    let main_config_path = match config_path_override {
        Some(override_path) => override_path.to_string(),
        None => {
            let path = format!("{base_path}/config.yml");
            info!("Loading configuration from '{path}'.");
            path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?.ok_or_else(|| {
        ConfigError::NotFound(format!(
            "Config file not found at '{main_config_path}'. Copy 'config.yml.example' to 'config.yml' and fill in your provider settings."
        ))
    })?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    let settings = builder
        // Layer 3: Environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Layer 4: Prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("CHARTGEN")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    // Deserialize the fully resolved configuration into our `AppConfig` struct.
    let config: AppConfig = settings.try_deserialize()?;
    Ok(config)
}
