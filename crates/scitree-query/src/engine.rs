//! Retrieval engine: embed, score, filter, rank.

use std::sync::Arc;
use std::time::Instant;

use scitree_client::{ClientError, EmbeddingClient};
use scitree_core::{DateCutoff, DocumentText, Result, Settings};
use scitree_index::{Corpus, QueryResult};

use crate::filters::{FilterChain, FilterContext};
use crate::intent::{TemporalIntent, TemporalIntentAnalyzer};

/// Per-call retrieval parameters.
#[derive(Debug, Clone, Default)]
pub struct RetrieveOptions {
    pub date_cutoff: Option<DateCutoff>,
    pub top_k: usize,
    /// Precomputed intent; skips analysis when set.
    pub temporal_intent: Option<TemporalIntent>,
}

impl RetrieveOptions {
    #[must_use]
    pub fn top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cutoff(mut self, cutoff: DateCutoff) -> Self {
        self.date_cutoff = Some(cutoff);
        self
    }
}

/// Sort by score descending, then id ascending, and keep the first `top_k`.
pub fn rank(hits: &mut Vec<QueryResult>, top_k: usize) {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    hits.truncate(top_k);
}

/// Nearest-neighbour search over the corpus with optional relevance filters.
pub struct RetrievalEngine {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn EmbeddingClient>,
    analyzer: Option<TemporalIntentAnalyzer>,
    filters: FilterChain,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("documents", &self.corpus.documents.len())
            .field("filters", &self.filters)
            .field("temporal_analysis", &self.analyzer.is_some())
            .finish()
    }
}

impl RetrievalEngine {
    /// Engine with no filters and no temporal analysis.
    pub fn new(corpus: Arc<Corpus>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            corpus,
            embedder,
            analyzer: None,
            filters: FilterChain::default(),
        }
    }

    /// Engine with the filters enabled in `settings`. The temporal analyzer
    /// is only attached when the date filter is on.
    pub fn from_settings(
        corpus: Arc<Corpus>,
        embedder: Arc<dyn EmbeddingClient>,
        analyzer: TemporalIntentAnalyzer,
        settings: &Settings,
    ) -> Self {
        Self {
            corpus,
            embedder,
            analyzer: settings.filters.date.then_some(analyzer),
            filters: FilterChain::from_settings(settings.filters),
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_analyzer(mut self, analyzer: TemporalIntentAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Ranked hits with their winning section and score.
    ///
    /// # Errors
    ///
    /// Returns [`scitree_core::ScitreeError::Retrieval`] if embedding or
    /// scoring fails and [`scitree_core::ScitreeError::Credential`] if the
    /// embedding client has no usable key. No partial results are returned.
    pub async fn retrieve_scored(
        &self,
        query: &str,
        opts: &RetrieveOptions,
    ) -> Result<Vec<QueryResult>> {
        let started = Instant::now();
        let (embedding, intent) = tokio::join!(self.embedder.embed(query), self.intent_for(query, opts));
        let embedding = embedding.map_err(ClientError::into_retrieval)?;

        let mut hits = self.corpus.index.best_sections(&embedding)?;
        let scored = hits.len();
        self.filters.apply(
            &mut hits,
            &FilterContext {
                query,
                documents: &self.corpus.documents,
                cutoff: opts.date_cutoff,
                intent: &intent,
            },
        );
        rank(&mut hits, opts.top_k);

        tracing::debug!(
            query,
            scored,
            returned = hits.len(),
            temporal = intent.has_temporal_aspect,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "retrieval complete"
        );
        Ok(hits)
    }

    /// Ranked document ids.
    ///
    /// # Errors
    ///
    /// See [`RetrievalEngine::retrieve_scored`].
    pub async fn retrieve(&self, query: &str, opts: &RetrieveOptions) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(query, opts)
            .await?
            .into_iter()
            .map(|hit| hit.id)
            .collect())
    }

    /// Resolve ids to their section texts, in the order given. Unknown ids
    /// are dropped with a warning.
    pub fn get_document_texts<S: AsRef<str>>(&self, ids: &[S]) -> Vec<DocumentText> {
        ids.iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let doc = self.corpus.documents.get(id);
                if doc.is_none() {
                    tracing::warn!(id, "document not found");
                }
                doc.map(DocumentText::from)
            })
            .collect()
    }

    async fn intent_for(&self, query: &str, opts: &RetrieveOptions) -> TemporalIntent {
        if let Some(intent) = &opts.temporal_intent {
            return intent.clone();
        }
        let Some(analyzer) = &self.analyzer else {
            return TemporalIntent::none();
        };
        match analyzer.analyze(query).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(query, error = %e, "temporal analysis failed; ignoring temporal aspect");
                TemporalIntent::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterChain;
    use crate::testing::{corpus, FixedEmbedder, ScriptedGenerator};
    use proptest::prelude::*;
    use scitree_core::{FilterSettings, ScitreeError, Section};

    fn engine(embedder: Arc<FixedEmbedder>) -> RetrievalEngine {
        RetrievalEngine::new(Arc::new(corpus()), embedder)
    }

    #[tokio::test]
    async fn returns_top_k_sorted_by_score() {
        let engine = engine(Arc::new(FixedEmbedder::new(vec![1.0, 0.0, 0.0])));
        let hits = engine
            .retrieve_scored("galaxy quenching", &RetrieveOptions::top_k(2))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "2301.00001");
        assert_eq!(hits[0].section, Section::Abstract);
        assert!(hits[0].score >= hits[1].score);

        let ids = engine
            .retrieve("galaxy quenching", &RetrieveOptions::top_k(10))
            .await
            .unwrap();
        assert_eq!(ids.len(), 4);
    }

    #[tokio::test]
    async fn embedding_failures_abort_retrieval() {
        let engine = engine(Arc::new(FixedEmbedder::failing(ClientError::Api {
            provider: "test",
            status: 500,
            message: "boom".into(),
        })));
        let err = engine
            .retrieve("q", &RetrieveOptions::top_k(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ScitreeError::Retrieval(_)));

        let engine = engine_with_missing_key();
        let err = engine
            .retrieve("q", &RetrieveOptions::top_k(3))
            .await
            .unwrap_err();
        assert!(err.is_credential());
    }

    fn engine_with_missing_key() -> RetrievalEngine {
        engine(Arc::new(FixedEmbedder::failing(ClientError::Credential(
            "OpenAI API key is not set".into(),
        ))))
    }

    #[tokio::test]
    async fn non_temporal_query_skips_intent_model() {
        let generator = Arc::new(ScriptedGenerator::new(["unused"]));
        let engine = engine(Arc::new(FixedEmbedder::new(vec![0.0, 1.0, 0.0])))
            .with_filters(FilterChain::from_settings(FilterSettings {
                date: true,
                ..FilterSettings::default()
            }))
            .with_analyzer(TemporalIntentAnalyzer::new(generator.clone(), "haiku", 300));

        let hits = engine
            .retrieve("what is the stellar mass of the Milky Way?", &RetrieveOptions::top_k(10))
            .await
            .unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn temporal_intent_prunes_by_year() {
        let generator = Arc::new(ScriptedGenerator::new([
            r#"{"expected_year_filter": "year >= 2015", "expected_recency_weight": 0}"#,
        ]));
        let engine = engine(Arc::new(FixedEmbedder::new(vec![0.0, 1.0, 0.0])))
            .with_filters(FilterChain::from_settings(FilterSettings {
                date: true,
                ..FilterSettings::default()
            }))
            .with_analyzer(TemporalIntentAnalyzer::new(generator.clone(), "haiku", 300));

        let ids = engine
            .retrieve(
                "What are the latest developments in exoplanet detection since 2015?",
                &RetrieveOptions::top_k(10),
            )
            .await
            .unwrap();
        assert_eq!(generator.calls(), 1);
        assert!(!ids.contains(&"astro-ph/9812003".to_string()));
        assert!(ids.contains(&"2301.00001".to_string()));
    }

    #[tokio::test]
    async fn failed_intent_analysis_falls_back() {
        let generator = Arc::new(ScriptedGenerator::new(["not json at all"]));
        let engine = engine(Arc::new(FixedEmbedder::new(vec![0.0, 1.0, 0.0])))
            .with_filters(FilterChain::from_settings(FilterSettings {
                date: true,
                ..FilterSettings::default()
            }))
            .with_analyzer(TemporalIntentAnalyzer::new(generator, "haiku", 300));

        let ids = engine
            .retrieve("recent quasar surveys", &RetrieveOptions::top_k(10))
            .await
            .unwrap();
        assert_eq!(ids.len(), 4);
    }

    #[tokio::test]
    async fn date_cutoff_applies_when_date_filter_enabled() {
        let engine = engine(Arc::new(FixedEmbedder::new(vec![1.0, 1.0, 1.0])))
            .with_filters(FilterChain::from_settings(FilterSettings {
                date: true,
                ..FilterSettings::default()
            }));
        let ids = engine
            .retrieve(
                "q",
                &RetrieveOptions::top_k(10).with_cutoff(DateCutoff::from_year(2016)),
            )
            .await
            .unwrap();
        assert!(!ids.contains(&"2301.00001".to_string()));
        assert!(ids.contains(&"1501.00002".to_string()));
    }

    #[test]
    fn unknown_ids_are_dropped_from_texts() {
        let engine = engine(Arc::new(FixedEmbedder::new(vec![1.0, 0.0, 0.0])));
        let texts = engine.get_document_texts(&["1501.00002", "missing", "2301.00001"]);
        let ids: Vec<_> = texts.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1501.00002", "2301.00001"]);
        assert_eq!(texts[0].abstract_text, "Dark matter halo profiles.");
    }

    fn arb_hits() -> impl Strategy<Value = Vec<QueryResult>> {
        prop::collection::vec(
            ("[a-e]{1,3}", -4i32..4).prop_map(|(id, score)| QueryResult {
                id,
                section: Section::Abstract,
                score: score as f32 * 0.25,
            }),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn rank_orders_by_score_then_id(mut hits in arb_hits(), top_k in 0usize..50) {
            let total = hits.len();
            rank(&mut hits, top_k);
            prop_assert_eq!(hits.len(), total.min(top_k));
            for pair in hits.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(a.score > b.score || (a.score == b.score && a.id <= b.id));
            }
        }
    }
}
