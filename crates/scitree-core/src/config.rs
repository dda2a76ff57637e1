//! Run configuration.
//!
//! Settings are read once per process from a YAML file (default
//! `scitree.yaml`), then environment overrides are applied. Every field has a
//! default, so an empty file is a valid configuration. API keys sit at the top
//! level of the file:
//!
//! ```yaml
//! openai_api_key: sk-...
//! anthropic_api_key: sk-ant-...
//! corpus:
//!   embeddings: vector_store/embeddings_matrix.npy
//! filters:
//!   date: true
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScitreeError};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "scitree.yaml";

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_CORPUS_DIR: &str = "SCITREE_CORPUS_DIR";

/// Immutable per-run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub corpus: CorpusPaths,
    pub models: ModelSettings,
    pub filters: FilterSettings,
    pub limits: Limits,
    pub generation: GenerationSettings,
}

impl Settings {
    /// Load settings from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists,
    /// then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ScitreeError::Config`] if an explicitly requested file is
    /// missing or any file fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(settings.with_env(|key| std::env::var(key).ok()))
    }

    /// Parse settings from a YAML file without applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ScitreeError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScitreeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&raw)
            .map_err(|e| ScitreeError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ScitreeError::Config`] if the YAML is malformed.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| ScitreeError::Config(e.to_string()))
    }

    /// Apply environment overrides using `lookup` to read variables.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(ENV_OPENAI_API_KEY) {
            self.credentials.openai_api_key = Some(key);
        }
        if let Some(key) = non_empty(ENV_ANTHROPIC_API_KEY) {
            self.credentials.anthropic_api_key = Some(key);
        }
        if let Some(dir) = non_empty(ENV_CORPUS_DIR) {
            self.corpus = CorpusPaths::in_dir(Path::new(&dir));
        }
        self
    }
}

/// API keys for the external clients. Never printed.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |k: &Option<String>| if k.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .finish()
    }
}

/// Locations of the corpus artifacts produced by the offline loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusPaths {
    pub embeddings: PathBuf,
    pub documents: PathBuf,
    pub index_mapping: PathBuf,
}

impl CorpusPaths {
    /// Standard artifact names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            embeddings: dir.join("embeddings_matrix.npy"),
            documents: dir.join("documents.json"),
            index_mapping: dir.join("index_mapping.json"),
        }
    }
}

impl Default for CorpusPaths {
    fn default() -> Self {
        Self::in_dir(Path::new("vector_store"))
    }
}

/// Model names and endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub embedding: String,
    pub embedding_base_url: String,
    pub generation: String,
    pub intent: String,
    pub anthropic_base_url: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            embedding: "text-embedding-3-small".to_string(),
            embedding_base_url: "https://api.openai.com/v1".to_string(),
            generation: "claude-3-5-sonnet-20240620".to_string(),
            intent: "claude-3-haiku-20240307".to_string(),
            anthropic_base_url: "https://api.anthropic.com/v1".to_string(),
        }
    }
}

/// Relevance filter toggles. All stages are off unless enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub citation: bool,
    pub date: bool,
    pub keywords: bool,
}

/// Rate, retry and timeout limits for external calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Global cap on in-flight embedding + generation requests.
    pub max_in_flight: usize,
    pub retry_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Whole-tree expansion deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            retry_attempts: 3,
            retry_base_delay_ms: 500,
            request_timeout_secs: 60,
            timeout_secs: None,
        }
    }
}

/// Tree generation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Persona prepended to every system prompt. `None` uses the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Observatory description appended to the persona.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment: Option<String>,
    pub max_tokens: usize,
    pub intent_max_tokens: usize,
    /// Documents retrieved to ground each node.
    pub top_k: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            background: None,
            experiment: None,
            max_tokens: 1000,
            intent_max_tokens: 300,
            top_k: 10,
        }
    }
}
