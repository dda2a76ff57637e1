//! Context assembly: ranked hits rendered as prompt-ready text plus the
//! full document records.

use std::fmt::Write as _;

use scitree_core::{Document, Result, Section};

use crate::engine::{RetrievalEngine, RetrieveOptions};

/// Retrieved context for a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    /// One `"<id>: <section text>\n"` line per requested section per hit.
    pub context: String,
    /// Hit documents in rank order, each carrying its retrieval score.
    pub documents: Vec<Document>,
}

impl RetrievalEngine {
    /// Retrieve and render the requested sections of the top hits.
    ///
    /// # Errors
    ///
    /// See [`RetrievalEngine::retrieve_scored`].
    pub async fn retrieve_context(
        &self,
        query: &str,
        opts: &RetrieveOptions,
        sections: &[Section],
    ) -> Result<RetrievedContext> {
        let hits = self.retrieve_scored(query, opts).await?;
        let mut out = RetrievedContext::default();
        for hit in hits {
            let Some(doc) = self.corpus().documents.get(&hit.id) else {
                tracing::warn!(id = %hit.id, "document not found");
                continue;
            };
            for &section in sections {
                let _ = writeln!(out.context, "{}: {}", doc.id, doc.section_text(section));
            }
            out.documents.push(Document {
                score: Some(hit.score),
                ..doc.clone()
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{corpus, FixedEmbedder};
    use std::sync::Arc;

    #[tokio::test]
    async fn renders_each_section_per_hit() {
        let engine = RetrievalEngine::new(
            Arc::new(corpus()),
            Arc::new(FixedEmbedder::new(vec![1.0, 0.0, 0.0])),
        );
        let ctx = engine
            .retrieve_context("q", &RetrieveOptions::top_k(2), &Section::ALL)
            .await
            .unwrap();

        assert_eq!(
            ctx.context,
            "2301.00001: Quenching in massive galaxies.\n\
             2301.00001: Quenching is rapid.\n\
             1501.00002: Dark matter halo profiles.\n\
             1501.00002: Halos are cuspy.\n"
        );
        assert_eq!(ctx.documents.len(), 2);
        assert_eq!(ctx.documents[0].title, "Quenching");
        let score = ctx.documents[0].score.unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn single_section_context() {
        let engine = RetrievalEngine::new(
            Arc::new(corpus()),
            Arc::new(FixedEmbedder::new(vec![1.0, 0.0, 0.0])),
        );
        let ctx = engine
            .retrieve_context("q", &RetrieveOptions::top_k(1), &[Section::Conclusions])
            .await
            .unwrap();
        assert_eq!(ctx.context, "2301.00001: Quenching is rapid.\n");
    }
}
