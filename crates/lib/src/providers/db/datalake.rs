use crate::builder::QuerySpec;
use crate::constants::{MAX_POLL_ATTEMPTS, POLL_INTERVAL, SCHEMA_POLL_ATTEMPTS};
use crate::errors::ChartgenError;
use crate::providers::db::backend::{ExecutionResult, QueryBackend};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A client for the asynchronous, job-based lakehouse query API.
///
/// Queries are submitted with `POST {base_url}/query`, which returns a
/// `jobId`. The job is then polled with `GET {base_url}/query/{jobId}`
/// until it reports `completed` or `failed`, or the attempt budget runs
/// out. Schema lookups go through `GET {base_url}/schema/{project}/{table}`
/// and may themselves return a job pointer that needs the same polling.
#[derive(Clone, Debug)]
pub struct DatalakeProvider {
    client: ReqwestClient,
    base_url: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
    schema_poll_attempts: u32,
}

impl DatalakeProvider {
    /// Creates a new client with the default polling cadence.
    pub fn new(base_url: String) -> Result<Self, ChartgenError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(ChartgenError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            base_url,
            poll_interval: POLL_INTERVAL,
            max_poll_attempts: MAX_POLL_ATTEMPTS,
            schema_poll_attempts: SCHEMA_POLL_ATTEMPTS,
        })
    }

    /// Overrides the polling cadence. Tests shrink the interval so a
    /// timeout path does not take a real minute.
    pub fn with_polling(
        mut self,
        interval: Duration,
        max_attempts: u32,
        schema_attempts: u32,
    ) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts;
        self.schema_poll_attempts = schema_attempts;
        self
    }

    /// Polls a submitted query job until it reaches a terminal state.
    async fn poll_job(&self, job_id: &str) -> Result<ExecutionResult, ChartgenError> {
        let url = format!("{}/query/{}", self.base_url, job_id);
        for attempt in 0..self.max_poll_attempts {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(ChartgenError::BackendRequest)?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(ChartgenError::BackendApi {
                    status: status.as_u16(),
                    message,
                });
            }

            let payload: ExecutionResult = response
                .json()
                .await
                .map_err(ChartgenError::BackendRequest)?;

            match payload.status.as_str() {
                "completed" => {
                    info!(
                        "[poll_job] Job {job_id} completed after {} poll(s) with {} row(s)",
                        attempt + 1,
                        payload.result_data.len()
                    );
                    return Ok(payload);
                }
                "failed" => {
                    let message = payload
                        .message
                        .unwrap_or_else(|| "Unknown error".to_string());
                    return Err(ChartgenError::JobFailed(message));
                }
                other => {
                    debug!("[poll_job] Job {job_id} is '{other}', waiting");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
        Err(ChartgenError::JobTimeout {
            attempts: self.max_poll_attempts,
        })
    }

    /// Polls a schema job that was handed back as a pointer instead of an
    /// immediate payload.
    async fn poll_schema_job(&self, job_id: &str) -> Result<Value, ChartgenError> {
        let url = format!("{}/query/{}", self.base_url, job_id);
        for _ in 0..self.schema_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(ChartgenError::BackendRequest)?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(ChartgenError::BackendRequest)?;
            let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

            // Sub-500 responses are transient and polled through; only a
            // server-side failure ends the poll.
            if status.as_u16() >= 500 {
                return Err(ChartgenError::BackendApi {
                    status: status.as_u16(),
                    message: body,
                });
            }

            match payload.get("status").and_then(Value::as_str) {
                Some("completed") => return Ok(payload),
                Some("failed") => {
                    let message = payload
                        .get("message")
                        .or_else(|| payload.get("error"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or(body);
                    return Err(ChartgenError::JobFailed(message));
                }
                _ => {}
            }
        }
        Err(ChartgenError::JobTimeout {
            attempts: self.schema_poll_attempts,
        })
    }
}

#[async_trait]
impl QueryBackend for DatalakeProvider {
    async fn execute(&self, query: &QuerySpec) -> Result<ExecutionResult, ChartgenError> {
        let url = format!("{}/query", self.base_url);
        debug!("[execute] Submitting query to {url}");

        let response = self
            .client
            .post(&url)
            .json(query)
            .send()
            .await
            .map_err(ChartgenError::BackendRequest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChartgenError::BackendApi {
                status: status.as_u16(),
                message,
            });
        }

        let submission: Value = response
            .json()
            .await
            .map_err(ChartgenError::BackendRequest)?;

        // A submission without a job id cannot be polled, so it is terminal.
        let job_id = submission
            .get("jobId")
            .and_then(Value::as_str)
            .ok_or(ChartgenError::JobMissingId)?;

        self.poll_job(job_id).await
    }

    async fn table_columns(
        &self,
        project_id: &str,
        table_name: &str,
    ) -> Result<Vec<Value>, ChartgenError> {
        let url = format!("{}/schema/{}/{}", self.base_url, project_id, table_name);
        debug!("[table_columns] Fetching schema from {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ChartgenError::BackendRequest)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(ChartgenError::BackendRequest)?;
        let mut payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload
                .get("error")
                .or_else(|| payload.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(body);
            return Err(ChartgenError::BackendApi {
                status: status.as_u16(),
                message,
            });
        }

        // Some deployments queue the schema scan and hand back a job pointer.
        let job_status = payload.get("status").and_then(Value::as_str).unwrap_or("");
        if matches!(job_status, "queued" | "running") {
            if let Some(job_id) = payload
                .get("jobId")
                .and_then(Value::as_str)
                .map(str::to_string)
            {
                warn!("[table_columns] Schema scan queued as job {job_id}, polling");
                payload = self.poll_schema_job(&job_id).await?;
            }
        }

        let rows = payload
            .get("resultData")
            .or_else(|| payload.get("result_data"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(rows)
    }
}
