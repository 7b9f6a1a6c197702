use crate::errors::ChartgenError;
use crate::providers::ai::AiProvider;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

// --- OpenAI-compatible API Structures ---

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

// --- Provider Implementation ---

/// A provider for any OpenAI-compatible chat completions endpoint, such as
/// OpenRouter or a locally hosted model server.
#[derive(Clone, Debug)]
pub struct OpenAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
}

impl OpenAiProvider {
    /// Creates a new `OpenAiProvider`.
    ///
    /// The API key is optional for local endpoints that do not authenticate.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
    ) -> Result<Self, ChartgenError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(ChartgenError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            max_tokens,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ChartgenError> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            },
        ];

        // Temperature stays at zero so repeated runs over the same schema
        // produce the same chart plan.
        let request_body = ChatRequest {
            messages,
            model: self.model.as_deref(),
            temperature: 0.0,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(ChartgenError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChartgenError::AiApi(error_text));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(ChartgenError::AiDeserialization)?;

        Ok(chat_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}
