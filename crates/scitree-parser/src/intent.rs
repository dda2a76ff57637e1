//! Parser for the temporal-intent extraction response.
//!
//! The model is asked for a single JSON object:
//!
//! ```json
//! {"expected_year_filter": "year >= 2015", "expected_recency_weight": 8}
//! ```
//!
//! Unknown keys, non-integer weights and filters outside the year grammar
//! are all rejected.

use serde::Deserialize;

use scitree_core::RecencyWeight;

use crate::ast::YearFilter;
use crate::error::ParseError;
use crate::year_filter::parse_year_filter;

/// Validated fields of an intent response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentResponse {
    pub year_filter: Option<YearFilter>,
    pub recency_weight: Option<RecencyWeight>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIntentResponse {
    expected_year_filter: Option<String>,
    expected_recency_weight: Option<i64>,
}

/// Parse and validate an intent response.
///
/// A surrounding Markdown code fence is tolerated; any other text outside the
/// JSON object is not.
///
/// # Errors
///
/// Returns [`ParseError::Response`] if the text is not the expected JSON
/// object or the weight is outside 0..=10, and the year-filter errors of
/// [`parse_year_filter`] if the filter expression is invalid.
pub fn parse_intent_response(text: &str) -> Result<IntentResponse, ParseError> {
    let body = strip_code_fence(text.trim());
    if !(body.starts_with('{') && body.ends_with('}')) {
        return Err(ParseError::Response(
            "expected a single JSON object".to_string(),
        ));
    }

    let raw: RawIntentResponse =
        serde_json::from_str(body).map_err(|e| ParseError::Response(e.to_string()))?;

    let year_filter = match raw.expected_year_filter.as_deref().map(str::trim) {
        Some(expr) if !expr.is_empty() => Some(parse_year_filter(expr)?),
        _ => None,
    };
    let recency_weight = raw
        .expected_recency_weight
        .map(RecencyWeight::try_from)
        .transpose()
        .map_err(|e| ParseError::Response(e.to_string()))?;

    Ok(IntentResponse {
        year_filter,
        recency_weight,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
