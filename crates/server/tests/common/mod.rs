#![allow(unused)]

use chartgen_server::{config::get_config, router::create_router, state::build_app_state};
use httpmock::prelude::*;
use httpmock::Mock;
use std::time::Duration;
use tempfile::TempDir;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// A running instance of the application for testing, backed by a single
/// `MockServer` that plays both the AI chat endpoint and the datalake API.
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub mock_server: MockServer,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application with the stock test configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with_overrides("").await
    }

    /// Spawns the application, appending `extra_yaml` to the generated
    /// config file before it is loaded.
    pub async fn spawn_with_overrides(extra_yaml: &str) -> Self {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start();

        // Write a config file pointing every outbound concern at the mock.
        let config_dir = tempfile::tempdir().expect("Failed to create temp config dir");
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"port: 0
datalake_base_url: "{datalake_url}"

providers:
  default:
    provider: "open_ai"
    api_url: "{chat_url}"
    model_name: "mock-chat-model"

{extra_yaml}
"#,
            datalake_url = mock_server.url("/api/v1"),
            chat_url = mock_server.url("/v1/chat/completions"),
        );
        std::fs::write(&config_path, config_content).expect("Failed to write test config");

        let config = get_config(config_path.to_str()).expect("Failed to load test configuration");
        let app_state = build_app_state(config)
            .await
            .expect("Failed to build application state");
        let app = create_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Test server crashed");
        });

        // Give the server a moment to start accepting connections.
        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            address,
            client: reqwest::Client::new(),
            mock_server,
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Mounts a chat-completion mock that answers requests whose body contains
/// `marker` with a single assistant message carrying `content`.
pub fn mock_chat<'a>(server: &'a MockServer, marker: &str, content: &str) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains(marker);
        then.status(200).json_body(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }));
    })
}

/// Mounts the pair of datalake mocks for one completed query job: the
/// submission matching `submit_marker` returns `job_id`, and the poll for
/// that job returns `rows`.
pub fn mock_completed_job<'a>(
    server: &'a MockServer,
    submit_marker: &str,
    job_id: &str,
    rows: serde_json::Value,
) -> (Mock<'a>, Mock<'a>) {
    let submit = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/query")
            .body_contains(submit_marker);
        then.status(200)
            .json_body(serde_json::json!({ "jobId": job_id }));
    });
    let poll = server.mock(|when, then| {
        when.method(GET).path(format!("/api/v1/query/{job_id}"));
        then.status(200).json_body(serde_json::json!({
            "status": "completed",
            "resultData": rows,
        }));
    });
    (submit, poll)
}
