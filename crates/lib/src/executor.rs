//! # The Core Executor
//!
//! This module defines the `ChartgenExecutor`, which is the primary entry
//! point for the chart generation pipeline. It holds all necessary
//! dependencies, such as AI providers and the query backend, and exposes
//! high-level methods that can be called by any consumer (like the `server`
//! crate).

use crate::{
    builder::{self, BuildResponse, QuerySpec, SelectColumn},
    catalog::ChartCatalog,
    constants::{PROFILE_SAMPLE_ROWS, SAMPLE_QUERY_LIMIT, SAMPLE_QUERY_MAX_COLUMNS},
    errors::ChartgenError,
    profile::{self, build_profile},
    providers::{ai::AiProvider, db::QueryBackend},
    reshape::{self, ChartData},
    suggest::{self, PromptSuggestions},
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Task name for the chart suggestion stage.
pub const TASK_CHART_SUGGESTION: &str = "chart_suggestion";
/// Task name for the query building stage.
pub const TASK_QUERY_BUILD: &str = "query_build";

/// A fully resolved task configuration: which provider to call and with
/// which prompt pair.
#[derive(Debug, Clone)]
pub struct ResolvedTask {
    pub provider: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// A struct that holds all the dependencies required to run the chart
/// generation pipeline. This decouples the pipeline from the server's
/// `AppState` or any other specific application container.
#[derive(Clone)]
pub struct ChartgenExecutor {
    pub ai_providers: Arc<HashMap<String, Box<dyn AiProvider>>>,
    pub tasks: Arc<HashMap<String, ResolvedTask>>,
    pub backend: Arc<dyn QueryBackend>,
    pub catalog: Arc<ChartCatalog>,
}

impl ChartgenExecutor {
    /// Creates a new `ChartgenExecutor`.
    pub fn new(
        ai_providers: Arc<HashMap<String, Box<dyn AiProvider>>>,
        tasks: Arc<HashMap<String, ResolvedTask>>,
        backend: Arc<dyn QueryBackend>,
        catalog: Arc<ChartCatalog>,
    ) -> Self {
        Self {
            ai_providers,
            tasks,
            backend,
            catalog,
        }
    }

    fn task(&self, task_name: &str) -> Result<&ResolvedTask, ChartgenError> {
        self.tasks
            .get(task_name)
            .ok_or_else(|| ChartgenError::TaskNotFound(task_name.to_string()))
    }

    fn provider_for(
        &self,
        task: &ResolvedTask,
        task_name: &str,
    ) -> Result<&dyn AiProvider, ChartgenError> {
        self.ai_providers
            .get(&task.provider)
            .map(|provider| provider.as_ref())
            .ok_or_else(|| {
                ChartgenError::MissingAiProvider(format!(
                    "Provider '{}' for task '{task_name}' not found in providers map.",
                    task.provider
                ))
            })
    }

    /// Suggests chart candidates for a batch of prompts.
    ///
    /// `metadata` may carry `columns` and `sample_rows` to ground the
    /// suggestions in a schema profile; without it every prompt gets the
    /// generic defaults.
    pub async fn suggest_charts(
        &self,
        user_prompts: &[String],
        metadata: Option<&Value>,
    ) -> Result<Vec<PromptSuggestions>, ChartgenError> {
        let task = self.task(TASK_CHART_SUGGESTION)?;
        let provider = self.provider_for(task, TASK_CHART_SUGGESTION)?;

        let profile = metadata.map(|meta| {
            let columns = meta
                .get("columns")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let sample_rows = meta
                .get("sample_rows")
                .or_else(|| meta.get("sampleRows"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            build_profile(&columns, &sample_rows, sample_rows.len() as u64)
        });

        Ok(suggest::suggest_charts(
            provider,
            &task.system_prompt,
            &task.user_prompt,
            user_prompts,
            profile.as_ref(),
        )
        .await)
    }

    /// Builds queries for already-made suggestions and executes every chart.
    ///
    /// The dataset identity must be present in the metadata; the source of
    /// every produced query is forced to `{projectId}.{tableName}` so a
    /// hallucinated table name can never reach the backend. Build failures
    /// are terminal here, while each chart's execution failure stays local
    /// to that chart.
    pub async fn build_and_execute(
        &self,
        dataset_metadata: &Value,
        suggestions: &[PromptSuggestions],
    ) -> Result<BuildResponse, ChartgenError> {
        let (project_id, table_name) = dataset_identity(dataset_metadata)?;
        let task = self.task(TASK_QUERY_BUILD)?;
        let provider = self.provider_for(task, TASK_QUERY_BUILD)?;

        let mut response = builder::build_charts(
            provider,
            &task.system_prompt,
            &task.user_prompt,
            dataset_metadata,
            suggestions,
            &self.catalog,
        )
        .await?;

        let source = format!("{project_id}.{table_name}");
        for chart in &mut response.charts {
            match chart.query.as_mut() {
                Some(query) => {
                    query.source = source.clone();
                    let outcome = self.run_chart_query(query).await;
                    apply_outcome(chart, outcome);
                }
                None => {
                    chart.data = Some(ChartData::default());
                    chart.error = Some("Chart is missing a query".to_string());
                }
            }
        }
        Ok(response)
    }

    /// Runs the full pipeline for a table: schema, profile, suggestions,
    /// queries, execution, reshaping.
    ///
    /// Only the schema fetch is load-bearing; every later stage degrades
    /// rather than failing the request. A chart whose query cannot run
    /// stays in the response with its error attached and empty data.
    pub async fn execute_prompt(
        &self,
        user_prompts: &[String],
        project_id: &str,
        table_name: &str,
    ) -> Result<BuildResponse, ChartgenError> {
        info!(
            "[execute_prompt] project='{project_id}', table='{table_name}', {} prompt(s)",
            user_prompts.len()
        );

        // The schema is the one thing the pipeline cannot proceed without.
        let columns = self.backend.table_columns(project_id, table_name).await?;
        info!("[execute_prompt] Fetched {} column(s)", columns.len());

        // A small sample sharpens type inference; losing it is tolerated.
        let sample_rows = match self.fetch_sample_rows(&columns, project_id, table_name).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("[execute_prompt] Sample query failed ({e}), profiling without rows");
                Vec::new()
            }
        };
        let row_count = sample_rows.len() as u64;
        let retained: Vec<Value> = sample_rows
            .into_iter()
            .take(PROFILE_SAMPLE_ROWS)
            .collect();

        let profile = build_profile(&columns, &retained, row_count);
        info!("[execute_prompt] Profile: {}", profile.summary);

        let suggestion_task = self.task(TASK_CHART_SUGGESTION)?;
        let suggestion_provider = self.provider_for(suggestion_task, TASK_CHART_SUGGESTION)?;
        let suggestions = suggest::suggest_charts(
            suggestion_provider,
            &suggestion_task.system_prompt,
            &suggestion_task.user_prompt,
            user_prompts,
            Some(&profile),
        )
        .await;

        // The builder sees the profiled schema, never the caller's metadata.
        let enhanced_metadata = json!({
            "columns": profile.columns,
            "column_names": profile.column_names,
            "summary": profile.summary,
            "projectId": project_id,
            "tableName": table_name,
        });

        let build_task = self.task(TASK_QUERY_BUILD)?;
        let build_provider = self.provider_for(build_task, TASK_QUERY_BUILD)?;
        let mut response = match builder::build_charts(
            build_provider,
            &build_task.system_prompt,
            &build_task.user_prompt,
            &enhanced_metadata,
            &suggestions,
            &self.catalog,
        )
        .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("[execute_prompt] Query build failed ({e}), using rule-based fallback");
                builder::fallback_build(&suggestions, &profile, project_id, table_name)
            }
        };

        let source = format!("{project_id}.{table_name}");
        let known: HashSet<&str> = profile.column_names.iter().map(String::as_str).collect();

        let charts = std::mem::take(&mut response.charts);
        let mut executed = Vec::with_capacity(charts.len());
        for mut chart in charts {
            let Some(query) = chart.query.as_mut() else {
                warn!(
                    "[execute_prompt] Chart {} has no query, skipping",
                    chart.chart_id
                );
                continue;
            };

            if !repair_select(query, &known) {
                warn!(
                    "[execute_prompt] Chart {} has no valid select columns, skipping",
                    chart.chart_id
                );
                continue;
            }
            query.source = source.clone();

            let outcome = self.run_chart_query(query).await;
            apply_outcome(&mut chart, outcome);
            executed.push(chart);
        }
        response.charts = executed;
        Ok(response)
    }

    /// Fetches the raw column descriptor rows for a table.
    pub async fn table_columns(
        &self,
        project_id: &str,
        table_name: &str,
    ) -> Result<Vec<Value>, ChartgenError> {
        self.backend.table_columns(project_id, table_name).await
    }

    /// Issues the bounded sampling query used to ground type inference.
    async fn fetch_sample_rows(
        &self,
        columns: &[Value],
        project_id: &str,
        table_name: &str,
    ) -> Result<Vec<Value>, ChartgenError> {
        let select: Vec<SelectColumn> = columns
            .iter()
            .take(SAMPLE_QUERY_MAX_COLUMNS)
            .map(|descriptor| {
                let name = profile::descriptor_name(descriptor);
                SelectColumn {
                    column: name.clone(),
                    aggregation: None,
                    alias: Some(name),
                }
            })
            .collect();

        let query = QuerySpec {
            source: format!("{project_id}.{table_name}"),
            select,
            limit: Some(SAMPLE_QUERY_LIMIT),
            ..QuerySpec::default()
        };

        let result = self.backend.execute(&query).await?;
        Ok(result.result_data)
    }

    async fn run_chart_query(&self, query: &QuerySpec) -> Result<ChartData, ChartgenError> {
        info!("[run_chart_query] Executing against '{}'", query.source);
        let result = self.backend.execute(query).await?;
        Ok(reshape::chart_data(&result))
    }
}

/// Attaches a finished chart's data, or its error with empty data, in
/// place. A failed chart stays in the response so the caller can see what
/// went wrong per chart.
fn apply_outcome(
    chart: &mut builder::BuiltChart,
    outcome: Result<ChartData, ChartgenError>,
) {
    match outcome {
        Ok(data) => {
            chart.data = Some(data);
            chart.error = None;
        }
        Err(e) => {
            warn!(
                "[apply_outcome] Execution failed for chart {}: {e}",
                chart.chart_id
            );
            chart.data = Some(ChartData::default());
            chart.error = Some(e.to_string());
        }
    }
}

/// Drops select entries that reference unknown columns. Returns whether
/// any select entries remain to execute.
fn repair_select(query: &mut QuerySpec, known: &HashSet<&str>) -> bool {
    let before = query.select.len();
    query.select.retain(|sel| known.contains(sel.column.as_str()));
    let dropped = before - query.select.len();
    if dropped > 0 {
        warn!("[repair_select] Dropped {dropped} select column(s) not present in the schema");
    }
    !query.select.is_empty()
}

/// Extracts the dataset identity from opaque metadata. Both camelCase and
/// snake_case spellings are accepted; a missing or empty field is an
/// error, never silently defaulted.
pub fn dataset_identity(metadata: &Value) -> Result<(String, String), ChartgenError> {
    let field = |camel: &str, snake: &str, label: &'static str| {
        metadata
            .get(camel)
            .or_else(|| metadata.get(snake))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(ChartgenError::MissingMetadata(label))
    };
    let project_id = field("projectId", "project_id", "projectId")?;
    let table_name = field("tableName", "table_name", "tableName")?;
    Ok((project_id, table_name))
}
