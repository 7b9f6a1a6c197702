//! # API Route Handlers
//!
//! This module contains the Axum handlers for the `chartgen-server`. Every
//! handler is a thin shim over the `ChartgenExecutor`: deserialize the
//! payload, delegate, serialize the result.

use crate::{errors::AppError, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use chartgen::{builder::BuildResponse, suggest::PromptSuggestions};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

// --- API Payloads ---

#[derive(Deserialize)]
pub struct SuggestChartsRequest {
    pub user_prompts: Vec<String>,
    /// Optional raw column metadata and sample rows grounding the suggestions.
    #[serde(default)]
    pub dataset_metadata: Option<Value>,
}

#[derive(Serialize)]
pub struct SuggestChartsResponse {
    pub suggestions: Vec<PromptSuggestions>,
}

#[derive(Deserialize)]
pub struct BuildQueriesRequest {
    pub dataset_metadata: Value,
    #[serde(default)]
    pub suggestions: Vec<PromptSuggestions>,
}

#[derive(Deserialize)]
pub struct ExecutePromptRequest {
    pub user_prompts: Vec<String>,
    pub project_id: String,
    pub table_name: String,
}

// --- General-Purpose Handlers ---

/// The handler for the root (`/`) endpoint.
pub async fn root() -> &'static str {
    "chartgen server is running."
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Serves the full chart catalog verbatim, for the dashboard's renderer.
pub async fn charts_config_handler(State(app_state): State<AppState>) -> Json<Value> {
    Json(app_state.executor.catalog.as_value())
}

// --- Pipeline Handlers ---

/// The handler for the `/suggest-charts` endpoint.
pub async fn suggest_charts_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<SuggestChartsRequest>,
) -> Result<Json<SuggestChartsResponse>, AppError> {
    info!(
        "Received suggestion request for {} prompt(s)",
        payload.user_prompts.len()
    );
    let suggestions = app_state
        .executor
        .suggest_charts(&payload.user_prompts, payload.dataset_metadata.as_ref())
        .await?;
    Ok(Json(SuggestChartsResponse { suggestions }))
}

/// The handler for the `/build-queries` endpoint. Builds queries for
/// already-made suggestions, executes them, and reshapes the results.
pub async fn build_queries_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<BuildQueriesRequest>,
) -> Result<Json<BuildResponse>, AppError> {
    info!(
        "Received build request with {} suggestion set(s)",
        payload.suggestions.len()
    );
    let response = app_state
        .executor
        .build_and_execute(&payload.dataset_metadata, &payload.suggestions)
        .await?;
    Ok(Json(response))
}

/// The handler for the `/execute-prompt` endpoint, the full pipeline from
/// table name to rendered chart data.
pub async fn execute_prompt_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ExecutePromptRequest>,
) -> Result<Json<BuildResponse>, AppError> {
    info!(
        "Received execute request: project='{}', table='{}', {} prompt(s)",
        payload.project_id,
        payload.table_name,
        payload.user_prompts.len()
    );
    let response = app_state
        .executor
        .execute_prompt(
            &payload.user_prompts,
            &payload.project_id,
            &payload.table_name,
        )
        .await?;
    Ok(Json(response))
}

/// Returns the raw column descriptor rows for a table, untouched.
pub async fn table_columns_handler(
    State(app_state): State<AppState>,
    Path((project_id, table_name)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let columns = app_state
        .executor
        .table_columns(&project_id, &table_name)
        .await?;
    Ok(Json(json!({ "columns": columns })))
}
