//! Anthropic messages API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::{CompletionRequest, GenerationClient};

const PROVIDER: &str = "Anthropic";
const API_VERSION: &str = "2023-06-01";

/// Single-attempt generation client. Wrap in [`crate::Guarded`] for retry
/// and request limiting.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("endpoint", &self.endpoint)
            .field("has_key", &self.api_key.is_some())
            .finish()
    }
}

impl AnthropicClient {
    /// Build a client. A missing key is only reported when a request is made.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                message: format!("failed to build Anthropic HTTP client: {e}"),
                retryable: false,
            })?;
        Ok(Self {
            client,
            endpoint: format!("{}/messages", base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl GenerationClient for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ClientError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ClientError::Credential("Anthropic API key is not set".to_string()))?;
        let key = HeaderValue::from_str(key.trim()).map_err(|_| {
            ClientError::Credential("Anthropic API key is not a valid header".to_string())
        })?;

        let body = MessagesRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: (!request.system.is_empty()).then_some(request.system),
            messages: [Message {
                role: "user",
                content: request.user,
            }],
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ClientError::from_status(PROVIDER, status.as_u16(), text));
        }

        let parsed: MessagesResponse = resp.json().await?;
        let answer = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        if answer.is_empty() {
            return Err(ClientError::Decode(
                "Anthropic response missing text content".to_string(),
            ));
        }
        Ok(answer)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
