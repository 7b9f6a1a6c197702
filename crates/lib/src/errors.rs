use thiserror::Error;

/// Custom error types for the chart generation pipeline.
#[derive(Error, Debug)]
pub enum ChartgenError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("Failed to send request to data backend: {0}")]
    BackendRequest(reqwest::Error),
    #[error("Data backend returned status {status}: {message}")]
    BackendApi { status: u16, message: String },
    #[error("Query submission response did not contain a job id")]
    JobMissingId,
    #[error("Query job failed: {0}")]
    JobFailed(String),
    #[error("Query job did not complete after {attempts} polls")]
    JobTimeout { attempts: u32 },
    #[error("AI provider is missing: {0}")]
    MissingAiProvider(String),
    #[error("Task configuration '{0}' not found")]
    TaskNotFound(String),
    #[error("Dataset metadata is missing required field '{0}'")]
    MissingMetadata(&'static str),
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}
