//! OpenAI-style chat completion client.

use super::{CompletionClient, Credentials};
use crate::config::{CompletionConfig, NetworkConfig};
use crate::error::{Result, TrustScoreError};
use crate::network::{retry_async, HttpClient, RetryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// First non-empty line of the first choice.
    fn first_line(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .and_then(|text| text.lines().map(str::trim).find(|l| !l.is_empty()))
            .map(str::to_string)
    }
}

/// Chat-completion collaborator posting to a configurable endpoint.
pub struct ChatCompletionClient {
    http: Arc<HttpClient>,
    endpoint: String,
    model: String,
    retry: RetryConfig,
}

impl ChatCompletionClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: Arc::new(HttpClient::with_timeout(NetworkConfig::COMPLETION_TIMEOUT)?),
            endpoint: endpoint.into(),
            model: model.into(),
            retry: RetryConfig::new().with_max_attempts(2),
        })
    }

    /// Endpoint and model from the environment, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var(CompletionConfig::ENDPOINT_ENV_VAR)
            .unwrap_or_else(|_| CompletionConfig::DEFAULT_ENDPOINT.to_string());
        let model = std::env::var(CompletionConfig::MODEL_ENV_VAR)
            .unwrap_or_else(|_| CompletionConfig::DEFAULT_MODEL.to_string());
        Self::new(endpoint, model)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str, credentials: &Credentials) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };
        let auth = credentials.api_key().map(|k| format!("Bearer {}", k));

        let response: ChatResponse = retry_async(&self.retry, "completion", || {
            let http = self.http.clone();
            let auth = auth.clone();
            let body = &body;
            let endpoint = self.endpoint.as_str();
            async move {
                let mut headers = vec![("Content-Type", "application/json")];
                if let Some(auth) = auth.as_deref() {
                    headers.push(("Authorization", auth));
                }
                http.post_json(endpoint, &headers, body).await
            }
        })
        .await?;

        let reply = response.first_line().ok_or_else(|| TrustScoreError::Completion {
            message: "empty completion reply".to_string(),
        })?;
        debug!("Completion reply: {:?}", reply);
        Ok(reply)
    }
}
