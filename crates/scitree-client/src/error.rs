use thiserror::Error;

use scitree_core::ScitreeError;

/// Failure of a single embedding or generation request.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("credential error: {0}")]
    Credential(String),

    #[error("{provider} returned {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("transport error: {message}")]
    Transport { message: String, retryable: bool },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Rate limits, server errors, timeouts and connection failures.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Transport { retryable, .. } => *retryable,
            Self::Credential(_) | Self::Decode(_) => false,
        }
    }

    /// Map an embedding failure into the retrieval error space.
    #[must_use]
    pub fn into_retrieval(self) -> ScitreeError {
        match self {
            Self::Credential(msg) => ScitreeError::Credential(msg),
            other => ScitreeError::Retrieval(other.to_string()),
        }
    }

    pub(crate) fn from_status(provider: &'static str, status: u16, body: String) -> Self {
        if status == 401 || status == 403 {
            Self::Credential(format!("{provider} rejected the API key ({status}): {body}"))
        } else {
            Self::Api {
                provider,
                status,
                message: body,
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Transport {
            retryable: err.is_timeout() || err.is_connect() || err.is_request() || err.is_body(),
            message: err.to_string(),
        }
    }
}

impl From<ClientError> for ScitreeError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Credential(msg) => ScitreeError::Credential(msg),
            other => ScitreeError::GenerationApi(other.to_string()),
        }
    }
}
