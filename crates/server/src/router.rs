use super::{handlers, state::AppState};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    let origins: Vec<HeaderValue> = app_state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/charts-config", get(handlers::charts_config_handler))
        .route("/suggest-charts", post(handlers::suggest_charts_handler))
        .route("/build-queries", post(handlers::build_queries_handler))
        .route("/execute-prompt", post(handlers::execute_prompt_handler))
        .route(
            "/schema/{project_id}/{table_name}/columns",
            get(handlers::table_columns_handler),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
