use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chartgen::ChartgenError;
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the
/// server, allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// Errors originating from the chart generation pipeline.
    Pipeline(ChartgenError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

/// Conversion from `ChartgenError` to `AppError`.
impl From<ChartgenError> for AppError {
    fn from(err: ChartgenError) -> Self {
        AppError::Pipeline(err)
    }
}

/// Conversion from `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Pipeline(err) => {
                // Log the original error for debugging purposes
                error!("ChartgenError: {:?}", err);
                match err {
                    ChartgenError::MissingAiProvider(_) | ChartgenError::TaskNotFound(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server is not configured correctly.".to_string(),
                    ),
                    ChartgenError::AiRequest(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Request to AI provider failed: {e}"),
                    ),
                    ChartgenError::AiDeserialization(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Failed to deserialize AI provider response: {e}"),
                    ),
                    ChartgenError::AiApi(e) => {
                        (StatusCode::BAD_GATEWAY, format!("AI provider error: {e}"))
                    }
                    ChartgenError::BackendRequest(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Request to data backend failed: {e}"),
                    ),
                    ChartgenError::BackendApi { status, message } => {
                        // Backend client errors are the caller's problem,
                        // backend outages are a gateway problem.
                        let code = if status >= 500 {
                            StatusCode::BAD_GATEWAY
                        } else {
                            StatusCode::BAD_REQUEST
                        };
                        (code, format!("Data backend returned status {status}: {message}"))
                    }
                    ChartgenError::JobMissingId => (
                        StatusCode::BAD_GATEWAY,
                        "Query submission response did not contain a job id".to_string(),
                    ),
                    ChartgenError::JobFailed(message) => {
                        (StatusCode::BAD_GATEWAY, format!("Query job failed: {message}"))
                    }
                    ChartgenError::JobTimeout { attempts } => (
                        StatusCode::GATEWAY_TIMEOUT,
                        format!("Query job did not complete after {attempts} polls"),
                    ),
                    ChartgenError::MissingMetadata(field) => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        format!("Dataset metadata is missing required field '{field}'"),
                    ),
                    ChartgenError::JsonSerialization(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to serialize result: {e}"),
                    ),
                    ChartgenError::ReqwestClientBuild(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to build HTTP client: {e}"),
                    ),
                }
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
