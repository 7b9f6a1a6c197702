use crate::builder::QuerySpec;
use crate::errors::ChartgenError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// The terminal payload of a completed backend job.
///
/// Field names are lenient on purpose: `resultData` is the canonical
/// spelling but `result_data` is accepted, and anything absent falls back
/// to its default so a sparse poll response still deserializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionResult {
    pub status: String,
    #[serde(alias = "result_data")]
    pub result_data: Vec<Value>,
    #[serde(alias = "row_count")]
    pub row_count: Option<u64>,
    pub message: Option<String>,
}

/// A trait for executing query specifications against a tabular data
/// backend.
///
/// The backend is job-oriented: submitting a query yields a job that is
/// polled to a terminal state. Implementations own their polling policy;
/// callers only see the terminal result or a terminal error.
#[async_trait]
pub trait QueryBackend: Send + Sync + Debug + DynClone {
    /// Submits a query and waits for its terminal result.
    async fn execute(&self, query: &QuerySpec) -> Result<ExecutionResult, ChartgenError>;

    /// Fetches the raw column descriptor rows for a table.
    async fn table_columns(
        &self,
        project_id: &str,
        table_name: &str,
    ) -> Result<Vec<Value>, ChartgenError>;
}

dyn_clone::clone_trait_object!(QueryBackend);
