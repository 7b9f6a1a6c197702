#![allow(dead_code)]
//! # Common Test Utilities
//!
//! This module provides shared utilities for testing, such as mock
//! providers and executor builders, to ensure tests are isolated and
//! repeatable.

use async_trait::async_trait;
use chartgen::builder::QuerySpec;
use chartgen::catalog::ChartCatalog;
use chartgen::errors::ChartgenError;
use chartgen::executor::{ChartgenExecutor, ResolvedTask, TASK_CHART_SUGGESTION, TASK_QUERY_BUILD};
use chartgen::profile::{build_profile, SchemaProfile};
use chartgen::prompts::{
    QUERY_BUILD_SYSTEM_PROMPT, QUERY_BUILD_USER_PROMPT, SUGGESTION_SYSTEM_PROMPT,
    SUGGESTION_USER_PROMPT,
};
use chartgen::providers::ai::AiProvider;
use chartgen::providers::db::{ExecutionResult, QueryBackend};
use dotenvy::dotenv;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Once, RwLock};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        tracing_subscriber::fmt::init();
    });
}

// --- Mock AI Provider for Logic Testing ---

#[derive(Clone, Debug)]
pub struct MockAiProvider {
    pub call_history: Arc<RwLock<Vec<(String, String)>>>,
    pub responses: Arc<RwLock<Vec<String>>>,
}

impl MockAiProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            call_history: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(responses.into_iter().rev().collect())),
        }
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ChartgenError> {
        self.call_history
            .write()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        if let Some(response) = self.responses.write().unwrap().pop() {
            Ok(response)
        } else {
            Ok("Default mock response".to_string())
        }
    }
}

/// A provider that always fails, for exercising the rule-based fallbacks.
#[derive(Clone, Debug)]
pub struct FailingAiProvider;

#[async_trait]
impl AiProvider for FailingAiProvider {
    async fn generate(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<String, ChartgenError> {
        Err(ChartgenError::AiApi("mock provider outage".to_string()))
    }
}

// --- Mock Query Backend for Logic Testing ---

#[derive(Clone, Debug)]
pub struct MockBackend {
    pub columns: Vec<Value>,
    pub results: Arc<RwLock<Vec<Result<ExecutionResult, ChartgenError>>>>,
    pub executed: Arc<RwLock<Vec<QuerySpec>>>,
}

impl MockBackend {
    /// Canned results are handed out in order; once exhausted, an empty
    /// completed result is returned.
    pub fn new(columns: Vec<Value>, results: Vec<Result<ExecutionResult, ChartgenError>>) -> Self {
        Self {
            columns,
            results: Arc::new(RwLock::new(results.into_iter().rev().collect())),
            executed: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl QueryBackend for MockBackend {
    async fn execute(&self, query: &QuerySpec) -> Result<ExecutionResult, ChartgenError> {
        self.executed.write().unwrap().push(query.clone());
        match self.results.write().unwrap().pop() {
            Some(result) => result,
            None => Ok(ExecutionResult {
                status: "completed".to_string(),
                ..ExecutionResult::default()
            }),
        }
    }

    async fn table_columns(
        &self,
        _project_id: &str,
        _table_name: &str,
    ) -> Result<Vec<Value>, ChartgenError> {
        Ok(self.columns.clone())
    }
}

/// A backend that refuses every call, for terminal-error paths.
#[derive(Clone, Debug)]
pub struct FailingBackend;

#[async_trait]
impl QueryBackend for FailingBackend {
    async fn execute(&self, _query: &QuerySpec) -> Result<ExecutionResult, ChartgenError> {
        Err(ChartgenError::BackendApi {
            status: 500,
            message: "backend down".to_string(),
        })
    }

    async fn table_columns(
        &self,
        _project_id: &str,
        _table_name: &str,
    ) -> Result<Vec<Value>, ChartgenError> {
        Err(ChartgenError::BackendApi {
            status: 500,
            message: "backend down".to_string(),
        })
    }
}

/// A completed execution result wrapping the given rows.
pub fn completed(rows: Vec<Value>) -> Result<ExecutionResult, ChartgenError> {
    Ok(ExecutionResult {
        status: "completed".to_string(),
        row_count: Some(rows.len() as u64),
        result_data: rows,
        message: None,
    })
}

/// Wires mock providers into a full executor with the default catalog and
/// the real prompt templates.
pub fn build_executor<B>(ai: MockAiProvider, backend: B) -> ChartgenExecutor
where
    B: QueryBackend + 'static,
{
    build_executor_with(Box::new(ai), backend)
}

pub fn build_executor_with<B>(ai: Box<dyn AiProvider>, backend: B) -> ChartgenExecutor
where
    B: QueryBackend + 'static,
{
    let mut providers: HashMap<String, Box<dyn AiProvider>> = HashMap::new();
    providers.insert("mock".to_string(), ai);

    let mut tasks = HashMap::new();
    tasks.insert(
        TASK_CHART_SUGGESTION.to_string(),
        ResolvedTask {
            provider: "mock".to_string(),
            system_prompt: SUGGESTION_SYSTEM_PROMPT.to_string(),
            user_prompt: SUGGESTION_USER_PROMPT.to_string(),
        },
    );
    tasks.insert(
        TASK_QUERY_BUILD.to_string(),
        ResolvedTask {
            provider: "mock".to_string(),
            system_prompt: QUERY_BUILD_SYSTEM_PROMPT.to_string(),
            user_prompt: QUERY_BUILD_USER_PROMPT.to_string(),
        },
    );

    ChartgenExecutor::new(
        Arc::new(providers),
        Arc::new(tasks),
        Arc::new(backend),
        Arc::new(ChartCatalog::default()),
    )
}

/// Builds a schema profile from (name, declared type) pairs plus sample
/// rows, the same way the pipeline does.
pub fn make_profile(columns: &[(&str, &str)], rows: &[Value]) -> SchemaProfile {
    let descriptors: Vec<Value> = columns
        .iter()
        .map(|(name, data_type)| json!({ "column_name": name, "data_type": data_type }))
        .collect();
    build_profile(&descriptors, rows, rows.len() as u64)
}
