//! Relevance filter chain: optional re-ranking and pruning stages applied
//! to scored hits before the final sort.

use scitree_core::{DateCutoff, Document, FilterSettings};
use scitree_index::{DocumentSet, QueryResult};

use crate::intent::TemporalIntent;

/// Maximum boost a document can receive from its citation count.
pub const CITATION_WEIGHT: f32 = 0.05;
/// Maximum boost a document can receive from recency, at weight 10 and age 0.
pub const RECENCY_WEIGHT_SCALE: f32 = 0.1;

/// Everything a stage may consult besides the hits themselves.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub query: &'a str,
    pub documents: &'a DocumentSet,
    pub cutoff: Option<DateCutoff>,
    pub intent: &'a TemporalIntent,
}

impl FilterContext<'_> {
    fn year_of(&self, id: &str) -> Option<i32> {
        self.documents.get(id).and_then(Document::year)
    }
}

/// A single stage of the chain.
pub trait RelevanceFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, hits: &mut Vec<QueryResult>, ctx: &FilterContext<'_>);
}

/// Boosts well-cited documents on a log scale relative to the most-cited hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationFilter;

impl RelevanceFilter for CitationFilter {
    fn name(&self) -> &'static str {
        "citation"
    }

    fn apply(&self, hits: &mut Vec<QueryResult>, ctx: &FilterContext<'_>) {
        let citations = |id: &str| ctx.documents.get(id).map_or(0, |d| d.n_citation);
        let max_n = hits.iter().map(|h| citations(&h.id)).max().unwrap_or(0);
        if max_n == 0 {
            return;
        }
        let denom = (max_n as f64).ln_1p();
        for hit in hits.iter_mut() {
            let boost = (citations(&hit.id) as f64).ln_1p() / denom;
            hit.score += CITATION_WEIGHT * boost as f32;
        }
    }
}

/// Enforces the date cutoff and the intent's year filter, then applies the
/// recency boost. Documents with no derivable year pass untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFilter;

impl RelevanceFilter for DateFilter {
    fn name(&self) -> &'static str {
        "date"
    }

    fn apply(&self, hits: &mut Vec<QueryResult>, ctx: &FilterContext<'_>) {
        hits.retain(|hit| {
            let Some(year) = ctx.year_of(&hit.id) else {
                return true;
            };
            ctx.cutoff.map_or(true, |c| c.admits(year))
                && ctx.intent.year_filter.as_ref().map_or(true, |f| f.matches(year))
        });

        let Some(weight) = ctx.intent.recency_weight.filter(|w| w.get() > 0) else {
            return;
        };
        let reference = ctx
            .cutoff
            .map(|c| c.year)
            .or_else(|| hits.iter().filter_map(|h| ctx.year_of(&h.id)).max());
        let Some(reference) = reference else {
            return;
        };
        for hit in hits.iter_mut() {
            if let Some(year) = ctx.year_of(&hit.id) {
                let age = (reference - year).max(0) as f32;
                hit.score += RECENCY_WEIGHT_SCALE * weight.fraction() / (1.0 + age);
            }
        }
    }
}

/// Keeps documents whose keywords appear as whole words in the query.
/// Leaves the hits alone when nothing matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordFilter;

impl RelevanceFilter for KeywordFilter {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn apply(&self, hits: &mut Vec<QueryResult>, ctx: &FilterContext<'_>) {
        let query = normalize_words(ctx.query);
        let matches = |hit: &QueryResult| {
            ctx.documents.get(&hit.id).is_some_and(|doc| {
                doc.keywords.iter().any(|kw| {
                    let kw = normalize_words(kw);
                    !kw.trim().is_empty() && query.contains(&kw)
                })
            })
        };
        if hits.iter().any(matches) {
            hits.retain(matches);
        }
    }
}

/// Lowercased words separated and surrounded by single spaces, so that a
/// substring test on two normalized strings is a whole-word phrase match.
fn normalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        out.push_str(&word.to_lowercase());
        out.push(' ');
    }
    out
}

/// Enabled stages in citation → date → keyword order.
#[derive(Default)]
pub struct FilterChain {
    stages: Vec<Box<dyn RelevanceFilter>>,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| s.name()))
            .finish()
    }
}

impl FilterChain {
    #[must_use]
    pub fn from_settings(settings: FilterSettings) -> Self {
        let mut stages: Vec<Box<dyn RelevanceFilter>> = Vec::new();
        if settings.citation {
            stages.push(Box::new(CitationFilter));
        }
        if settings.date {
            stages.push(Box::new(DateFilter));
        }
        if settings.keywords {
            stages.push(Box::new(KeywordFilter));
        }
        Self { stages }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn apply(&self, hits: &mut Vec<QueryResult>, ctx: &FilterContext<'_>) {
        for stage in &self.stages {
            let before = hits.len();
            stage.apply(hits, ctx);
            tracing::debug!(stage = stage.name(), before, after = hits.len(), "filter applied");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scitree_core::{RecencyWeight, Section};
    use scitree_parser::parse_year_filter;

    fn doc(id: &str, n_citation: u64, keywords: &[&str]) -> Document {
        Document {
            id: id.to_string(),
            source: id.to_string(),
            n_citation,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            ..Document::default()
        }
    }

    fn hit(id: &str, score: f32) -> QueryResult {
        QueryResult {
            id: id.to_string(),
            section: Section::Abstract,
            score,
        }
    }

    fn corpus() -> DocumentSet {
        DocumentSet::new(vec![
            doc("2301.00001", 100, &["JWST", "high redshift"]),
            doc("1501.00002", 10, &["dark matter"]),
            doc("astro-ph/9812003", 0, &["Cepheids"]),
            doc("no-year", 0, &[]),
        ])
        .unwrap()
    }

    fn ctx<'a>(
        query: &'a str,
        documents: &'a DocumentSet,
        cutoff: Option<DateCutoff>,
        intent: &'a TemporalIntent,
    ) -> FilterContext<'a> {
        FilterContext {
            query,
            documents,
            cutoff,
            intent,
        }
    }

    #[test]
    fn citation_boost_is_log_scaled_to_max() {
        let docs = corpus();
        let intent = TemporalIntent::none();
        let mut hits = vec![hit("2301.00001", 0.5), hit("1501.00002", 0.5), hit("no-year", 0.5)];
        CitationFilter.apply(&mut hits, &ctx("q", &docs, None, &intent));
        assert!((hits[0].score - (0.5 + CITATION_WEIGHT)).abs() < 1e-6);
        assert!(hits[1].score > 0.5 && hits[1].score < hits[0].score);
        assert!((hits[2].score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn citation_filter_is_noop_without_citations() {
        let docs = corpus();
        let intent = TemporalIntent::none();
        let mut hits = vec![hit("astro-ph/9812003", 0.3), hit("no-year", 0.2)];
        CitationFilter.apply(&mut hits, &ctx("q", &docs, None, &intent));
        assert_eq!(hits, vec![hit("astro-ph/9812003", 0.3), hit("no-year", 0.2)]);
    }

    #[test]
    fn date_filter_applies_cutoff_and_year_filter() {
        let docs = corpus();
        let all = || {
            vec![
                hit("2301.00001", 0.1),
                hit("1501.00002", 0.1),
                hit("astro-ph/9812003", 0.1),
                hit("no-year", 0.1),
            ]
        };

        let none = TemporalIntent::none();
        let mut hits = all();
        DateFilter.apply(&mut hits, &ctx("q", &docs, Some(DateCutoff::from_year(2020)), &none));
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["1501.00002", "astro-ph/9812003", "no-year"]);

        let intent = TemporalIntent {
            has_temporal_aspect: true,
            year_filter: Some(parse_year_filter("year < 2000").unwrap()),
            recency_weight: None,
        };
        let mut hits = all();
        DateFilter.apply(&mut hits, &ctx("q", &docs, None, &intent));
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["astro-ph/9812003", "no-year"]);
    }

    #[test]
    fn recency_boost_favours_newer_documents() {
        let docs = corpus();
        let intent = TemporalIntent {
            has_temporal_aspect: true,
            year_filter: None,
            recency_weight: Some(RecencyWeight::try_from(10).unwrap()),
        };
        let mut hits = vec![hit("2301.00001", 0.0), hit("1501.00002", 0.0), hit("no-year", 0.0)];
        DateFilter.apply(&mut hits, &ctx("q", &docs, None, &intent));
        // Age is measured from the newest candidate (2023).
        assert!((hits[0].score - RECENCY_WEIGHT_SCALE).abs() < 1e-6);
        assert!((hits[1].score - RECENCY_WEIGHT_SCALE / 9.0).abs() < 1e-6);
        assert_eq!(hits[2].score, 0.0);
    }

    #[test]
    fn keyword_filter_needs_whole_word_match() {
        let docs = corpus();
        let intent = TemporalIntent::none();
        let mut hits = vec![hit("2301.00001", 0.2), hit("1501.00002", 0.9)];
        KeywordFilter.apply(
            &mut hits,
            &ctx("What does JWST see at high-redshift?", &docs, None, &intent),
        );
        assert_eq!(hits, vec![hit("2301.00001", 0.2)]);

        let mut hits = vec![hit("2301.00001", 0.2), hit("1501.00002", 0.9)];
        KeywordFilter.apply(&mut hits, &ctx("dark mattering", &docs, None, &intent));
        assert_eq!(hits.len(), 2, "no match leaves hits unchanged");
    }

    #[test]
    fn chain_runs_only_enabled_stages() {
        assert!(FilterChain::from_settings(FilterSettings::default()).is_empty());
        let chain = FilterChain::from_settings(FilterSettings {
            citation: true,
            date: false,
            keywords: true,
        });
        assert_eq!(format!("{chain:?}"), r#"["citation", "keyword"]"#);
    }
}
