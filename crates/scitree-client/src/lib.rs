//! # scitree-client
//!
//! Seams to the two external model services:
//! - [`EmbeddingClient`]: text to embedding vector ([`OpenAiEmbedder`])
//! - [`GenerationClient`]: system + user prompt to text ([`AnthropicClient`])
//!
//! [`Guarded`] adds retry with exponential backoff and a global cap on
//! in-flight requests shared by both clients.

pub mod anthropic;
pub mod error;
pub mod guarded;
pub mod openai;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use scitree_core::Settings;

pub use anthropic::AnthropicClient;
pub use error::ClientError;
pub use guarded::Guarded;
pub use openai::OpenAiEmbedder;
pub use retry::RetryPolicy;

/// Produces the embedding of a piece of text.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError>;
}

/// One generation call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub model: &'a str,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// Produces text from a system and user prompt.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ClientError>;

    /// Whether a credential is present. Checked before a run starts.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Production clients sharing one request limiter.
#[derive(Clone)]
pub struct Clients {
    pub embedder: Arc<dyn EmbeddingClient>,
    pub generator: Arc<dyn GenerationClient>,
}

impl Clients {
    /// Build the OpenAI embedder and Anthropic generator from settings.
    /// Missing keys surface as [`ClientError::Credential`] on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if an HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let limits = &settings.limits;
        let timeout = Duration::from_secs(limits.request_timeout_secs.max(1));
        let permits = Arc::new(Semaphore::new(limits.max_in_flight.max(1)));
        let retry = RetryPolicy {
            max_attempts: limits.retry_attempts.max(1),
            base_delay: Duration::from_millis(limits.retry_base_delay_ms),
            ..RetryPolicy::default()
        };

        let embedder = OpenAiEmbedder::new(
            settings.credentials.openai_api_key.clone(),
            &settings.models.embedding_base_url,
            settings.models.embedding.clone(),
            timeout,
        )?;
        let generator = AnthropicClient::new(
            settings.credentials.anthropic_api_key.clone(),
            &settings.models.anthropic_base_url,
            timeout,
        )?;

        Ok(Self {
            embedder: Arc::new(Guarded::new(embedder, Arc::clone(&permits), retry)),
            generator: Arc::new(Guarded::new(generator, permits, retry)),
        })
    }
}
