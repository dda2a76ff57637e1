//! Retry and global in-flight limiting around any client.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::ClientError;
use crate::retry::RetryPolicy;
use crate::{CompletionRequest, EmbeddingClient, GenerationClient};

/// Wraps a client so every attempt holds a permit from a shared semaphore
/// and transient failures are retried. The permit is released while backing
/// off.
#[derive(Debug)]
pub struct Guarded<C> {
    inner: C,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl<C> Guarded<C> {
    pub fn new(inner: C, permits: Arc<Semaphore>, retry: RetryPolicy) -> Self {
        Self {
            inner,
            permits,
            retry,
        }
    }

    async fn acquire(&self) -> Result<SemaphorePermit<'_>, ClientError> {
        self.permits
            .acquire()
            .await
            .map_err(|_| ClientError::Transport {
                message: "request limiter closed".to_string(),
                retryable: false,
            })
    }
}

#[async_trait]
impl<C: EmbeddingClient> EmbeddingClient for Guarded<C> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError> {
        self.retry
            .run("embedding", || async move {
                let _permit = self.acquire().await?;
                self.inner.embed(text).await
            })
            .await
    }
}

#[async_trait]
impl<C: GenerationClient> GenerationClient for Guarded<C> {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ClientError> {
        self.retry
            .run("generation", || async move {
                let _permit = self.acquire().await?;
                self.inner.complete(request).await
            })
            .await
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }
}
