//! Temporal intent detection.
//!
//! A cheap pattern check decides whether a query mentions time at all; only
//! then is the generation model asked for a year filter and recency weight.

use std::sync::{Arc, LazyLock};
use std::time::Instant;

use regex::Regex;

use scitree_client::{ClientError, CompletionRequest, GenerationClient};
use scitree_core::{RecencyWeight, Result, ScitreeError, Settings};
use scitree_parser::{parse_intent_response, YearFilter};

/// Time-related constraints extracted from a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporalIntent {
    pub has_temporal_aspect: bool,
    pub year_filter: Option<YearFilter>,
    pub recency_weight: Option<RecencyWeight>,
}

impl TemporalIntent {
    /// No temporal aspect.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

static TEMPORAL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let alternatives = [
        // years, decades and ranges
        r"\d{4}s?(?:\s*-\s*\d{4}s?)?",
        r"\d{2}s",
        r"\d{1,2}(?:st|nd|rd|th)\s+century",
        r"(?:last|past|next|coming|future)\s+\d+\s+(?:years?|decades?|centuries|century)",
        r"recent|latest|current|ongoing|future|past|historical|ancient",
        r"evolution|changes?|advancements?|developments?|progress",
        r"solar\s+eclipse|equinox|solstice",
        r"mission|probe|telescope|spacecraft",
        r"nobel\s+prize|discovery|detection",
        r"before\s+and\s+after|compared\s+with|vs\.?",
        r"since|until|prior\s+to|post-|pre-",
        r"AD|BC",
        r"release|launch",
    ];
    let pattern = format!(r"(?i)\b(?:{})", alternatives.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(error = %e, "temporal pattern failed to compile");
            None
        }
    }
});

/// Whether `query` contains any temporal cue. Matches start on a word
/// boundary and are case-insensitive.
#[must_use]
pub fn is_temporal_query(query: &str) -> bool {
    TEMPORAL_PATTERN.as_ref().is_some_and(|re| {
        re.find_iter(query).any(|m| ends_on_word_boundary(query, m.end()))
    })
}

fn ends_on_word_boundary(text: &str, end: usize) -> bool {
    let before = text[..end].chars().next_back();
    let after = text[end..].chars().next();
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    // Hyphenated prefixes ("post-", "pre-") end on a non-word character.
    !is_word(before) || !is_word(after)
}

fn intent_prompt(query: &str) -> String {
    format!(
        r#"Analyze the following query for its temporal aspects. Respond with a JSON object with exactly these keys:
- "expected_year_filter": a string holding a Boolean expression for filtering publication years, or null if not applicable. Use `year` as the only variable, lowercase `and`, `or`, `not` as logical operators, and only integer comparisons with years (e.g. "year >= 2000", "year < 1990", "year == 2019", "year != 2020").
- "expected_recency_weight": an integer from 0 to 10 giving the importance of recency (0 for no recency bias, 10 for extreme recency bias), or null if not applicable.

Examples:

Query: "What are the latest developments in exoplanet detection since 2015?"
{{"expected_year_filter": "year >= 2015", "expected_recency_weight": 8}}

Query: "Compare galaxy formation theories from the 1990s and 2020s."
{{"expected_year_filter": "(year >= 1990 and year < 2000) or (year >= 2020 and year < 2030)", "expected_recency_weight": 5}}

Query: "{query}"

Respond only with the JSON object, no other text."#
    )
}

/// Extracts a [`TemporalIntent`] from free-text queries.
#[derive(Clone)]
pub struct TemporalIntentAnalyzer {
    client: Arc<dyn GenerationClient>,
    model: String,
    max_tokens: usize,
}

impl TemporalIntentAnalyzer {
    pub fn new(client: Arc<dyn GenerationClient>, model: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
        }
    }

    /// Analyzer using the configured intent model and token limit.
    pub fn from_settings(client: Arc<dyn GenerationClient>, settings: &Settings) -> Self {
        Self::new(
            client,
            settings.models.intent.clone(),
            settings.generation.intent_max_tokens,
        )
    }

    /// Classify `query`. Queries without temporal cues never reach the model.
    ///
    /// # Errors
    ///
    /// Returns [`ScitreeError::TemporalAnalysis`] if the model call fails or
    /// its reply is not a valid intent object, and
    /// [`ScitreeError::Credential`] if the client has no usable key.
    pub async fn analyze(&self, query: &str) -> Result<TemporalIntent> {
        let started = Instant::now();
        if !is_temporal_query(query) {
            tracing::debug!(query, "no temporal cues");
            return Ok(TemporalIntent::none());
        }

        let prompt = intent_prompt(query);
        let request = CompletionRequest {
            system: "",
            user: &prompt,
            model: &self.model,
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };
        let reply = self.client.complete(&request).await.map_err(|e| match e {
            ClientError::Credential(msg) => ScitreeError::Credential(msg),
            other => ScitreeError::TemporalAnalysis(other.to_string()),
        })?;
        let parsed = parse_intent_response(&reply)
            .map_err(|e| ScitreeError::TemporalAnalysis(e.to_string()))?;

        let intent = TemporalIntent {
            has_temporal_aspect: true,
            year_filter: parsed.year_filter,
            recency_weight: parsed.recency_weight,
        };
        tracing::info!(
            query,
            year_filter = ?intent.year_filter.as_ref().map(ToString::to_string),
            recency_weight = ?intent.recency_weight.map(RecencyWeight::get),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "temporal intent analyzed"
        );
        Ok(intent)
    }
}
