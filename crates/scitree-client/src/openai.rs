//! OpenAI-compatible embeddings client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::EmbeddingClient;

const PROVIDER: &str = "OpenAI";

/// Single-attempt embeddings client. Wrap in [`crate::Guarded`] for retry
/// and request limiting.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("has_key", &self.api_key.is_some())
            .finish()
    }
}

impl OpenAiEmbedder {
    /// Build a client. A missing key is only reported when a request is made.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                message: format!("failed to build OpenAI HTTP client: {e}"),
                retryable: false,
            })?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn auth_header(&self) -> Result<HeaderValue, ClientError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ClientError::Credential("OpenAI API key is not set".to_string()))?;
        HeaderValue::from_str(&format!("Bearer {}", key.trim()))
            .map_err(|_| ClientError::Credential("OpenAI API key is not a valid header".to_string()))
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError> {
        let auth = self.auth_header()?;
        let request = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, auth)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ClientError::from_status(PROVIDER, status.as_u16(), body));
        }

        let parsed: EmbeddingResponse = resp.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| ClientError::Decode("OpenAI returned no embedding".to_string()))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let embedder = OpenAiEmbedder::new(
            None,
            "http://127.0.0.1:9",
            "text-embedding-3-small",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(
            embedder.embed("galaxies").await,
            Err(ClientError::Credential(_))
        ));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let embedder =
            OpenAiEmbedder::new(Some("  ".into()), "https://api.openai.com/v1/", "m", Duration::from_secs(1))
                .unwrap();
        assert!(embedder.auth_header().is_err());
        assert_eq!(embedder.endpoint, "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn debug_does_not_leak_key() {
        let embedder = OpenAiEmbedder::new(
            Some("sk-secret".into()),
            "https://api.openai.com/v1",
            "m",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!format!("{embedder:?}").contains("sk-secret"));
    }
}
