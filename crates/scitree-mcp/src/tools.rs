//! MCP tool definitions for scitree retrieval and tree expansion.

use std::sync::Arc;
use std::time::Duration;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::Deserialize;

use scitree_core::{current_year, paper_url, DateCutoff, Settings};
use scitree_query::RetrieveOptions;
use scitree_tree::{CancellationToken, ExpansionRequest, TreeEngine};

/// scitree MCP server over a loaded corpus and configured clients.
#[derive(Debug, Clone)]
pub struct ScitreeMcpService {
    engine: Arc<TreeEngine>,
    settings: Arc<Settings>,
    tool_router: ToolRouter<Self>,
}

impl ScitreeMcpService {
    pub fn new(engine: Arc<TreeEngine>, settings: Arc<Settings>) -> Self {
        Self {
            engine,
            settings,
            tool_router: Self::tool_router(),
        }
    }
}

fn error_json(message: impl std::fmt::Display) -> String {
    serde_json::json!({ "error": message.to_string() }).to_string()
}

// === Tool request types ===

/// Request for nearest-neighbour retrieval.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RetrieveRequest {
    /// Free-text query
    pub query: String,
    /// Maximum results to return (default: 10)
    pub top_k: Option<usize>,
    /// Latest publication date to consider: a year ("2020") or an arXiv id.
    /// Ignored unless the server has the date filter enabled.
    pub date_cutoff: Option<String>,
}

/// Request to resolve document ids.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetDocumentsRequest {
    /// Corpus document ids (e.g., 2301.00001)
    pub ids: Vec<String>,
}

/// Request to expand a science goal.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExpandRequest {
    /// Root science goal
    pub goal: String,
    /// Latest publication year used for grounding (default: current year)
    pub year_cutoff: Option<i32>,
    /// Maximum children per node (default: 2)
    pub branching_factor: Option<usize>,
    /// Generation temperature (default: 0.5)
    pub temperature: Option<f32>,
}

#[tool_router]
impl ScitreeMcpService {
    /// Ranked hits for a query.
    #[tool(
        description = "Retrieve the papers closest to a query, with their best-matching section and score"
    )]
    async fn scitree_retrieve(&self, Parameters(req): Parameters<RetrieveRequest>) -> String {
        let mut opts = RetrieveOptions::top_k(req.top_k.unwrap_or(10));
        if let Some(raw) = req.date_cutoff.as_deref() {
            match DateCutoff::parse(raw) {
                Ok(cutoff) => opts = opts.with_cutoff(cutoff),
                Err(e) => return error_json(format!("Invalid date cutoff: {e}")),
            }
            if !self.settings.filters.date {
                tracing::warn!(cutoff = raw, "date cutoff ignored: date filter is disabled");
            }
        }
        tracing::info!(query = %req.query, top_k = opts.top_k, "mcp retrieve");
        let retrieval = self.engine.retrieval();
        let hits = match retrieval.retrieve_scored(&req.query, &opts).await {
            Ok(h) => h,
            Err(e) => return error_json(format!("Retrieval failed: {e}")),
        };
        let documents = &retrieval.corpus().documents;
        let json: Vec<serde_json::Value> = hits
            .iter()
            .map(|hit| {
                serde_json::json!({
                    "id": hit.id,
                    "section": hit.section,
                    "score": hit.score,
                    "title": documents.get(&hit.id).map(|d| d.title.as_str()),
                    "url": paper_url(&hit.id),
                })
            })
            .collect();
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| "[]".to_string())
    }

    /// Abstract and conclusions for each known id.
    #[tool(description = "Get the abstract and conclusions of papers by id; unknown ids are omitted")]
    fn scitree_get_documents(&self, Parameters(req): Parameters<GetDocumentsRequest>) -> String {
        let texts = self.engine.retrieval().get_document_texts(&req.ids);
        serde_json::to_string_pretty(&texts).unwrap_or_else(|_| "[]".to_string())
    }

    /// Expand a goal into a science tree.
    #[tool(
        description = "Expand a science goal into objectives, physical parameters and observables, each grounded in retrieved papers"
    )]
    async fn scitree_expand(&self, Parameters(req): Parameters<ExpandRequest>) -> String {
        let generation = &self.settings.generation;
        let request = ExpansionRequest {
            branching_factor: req.branching_factor.unwrap_or(2),
            temperature: req.temperature.unwrap_or(0.5),
            background: generation.background.clone(),
            experiment: generation.experiment.clone(),
            ..ExpansionRequest::new(req.goal, req.year_cutoff.unwrap_or_else(current_year))
        };
        let timeout = self.settings.limits.timeout_secs.map(Duration::from_secs);
        tracing::info!(goal = %request.root_text, n = request.branching_factor, "mcp expand");
        let expansion = match self
            .engine
            .expand_with(&request, &CancellationToken::new(), timeout)
            .await
        {
            Ok(x) => x,
            Err(e) => return error_json(format!("Expansion failed: {e}")),
        };
        let json = serde_json::json!({
            "tree": expansion.root.to_record(),
            "report": expansion.report,
        });
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
    }
}

#[tool_handler]
impl ServerHandler for ScitreeMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "scitree server. Retrieve papers from the embedded corpus, read their \
                 abstracts and conclusions, and expand a science goal into a grounded tree."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;

    use scitree_client::{ClientError, CompletionRequest, EmbeddingClient, GenerationClient};
    use scitree_core::Document;
    use scitree_index::{Corpus, SectionRows};
    use scitree_query::RetrievalEngine;
    use scitree_tree::TreeConfig;

    use super::*;

    struct UnitEmbedder;

    #[async_trait]
    impl EmbeddingClient for UnitEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ClientError> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct OneChild;

    #[async_trait]
    impl GenerationClient for OneChild {
        async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, ClientError> {
            Ok("{child}".to_string())
        }
    }

    fn doc(id: &str, title: &str, abstract_text: &str) -> Document {
        Document {
            id: id.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
            source: id.into(),
            ..Document::default()
        }
    }

    fn service() -> ScitreeMcpService {
        let rows = |row| SectionRows {
            abstract_row: Some(row),
            conclusions: None,
        };
        let corpus = Corpus::from_parts(
            vec![
                doc("2301.00001", "Quenching", "Quenching in massive galaxies."),
                doc("1501.00002", "Halos", "Dark matter halo profiles."),
            ],
            vec![0.6, 0.8, 1.0, 0.0],
            2,
            BTreeMap::from([
                ("2301.00001".to_string(), rows(0)),
                ("1501.00002".to_string(), rows(1)),
            ]),
        )
        .unwrap();
        let retrieval = RetrievalEngine::new(Arc::new(corpus), Arc::new(UnitEmbedder));
        let engine = TreeEngine::new(Arc::new(retrieval), Arc::new(OneChild), TreeConfig::default());
        ScitreeMcpService::new(Arc::new(engine), Arc::new(Settings::default()))
    }

    #[tokio::test]
    async fn retrieve_returns_ranked_hits() {
        let out = service()
            .scitree_retrieve(Parameters(RetrieveRequest {
                query: "halo profiles".into(),
                top_k: Some(1),
                date_cutoff: None,
            }))
            .await;
        let hits: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["id"], "1501.00002");
        assert_eq!(hits[0]["section"], "abstract");
        assert_eq!(hits[0]["title"], "Halos");
        assert_eq!(hits[0]["url"], "https://arxiv.org/abs/1501.00002");
    }

    #[tokio::test]
    async fn retrieve_rejects_bad_cutoff() {
        let out = service()
            .scitree_retrieve(Parameters(RetrieveRequest {
                query: "anything".into(),
                top_k: None,
                date_cutoff: Some("last tuesday".into()),
            }))
            .await;
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(json["error"].as_str().unwrap().contains("Invalid date cutoff"));
    }

    #[test]
    fn get_documents_omits_unknown_ids() {
        let out = service().scitree_get_documents(Parameters(GetDocumentsRequest {
            ids: vec!["2301.00001".into(), "9999.99999".into()],
        }));
        let docs: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["abstract"], "Quenching in massive galaxies.");
    }

    #[tokio::test]
    async fn expand_returns_tree_and_report() {
        let out = service()
            .scitree_expand(Parameters(ExpandRequest {
                goal: "Understand galaxy evolution".into(),
                year_cutoff: Some(2024),
                branching_factor: Some(1),
                temperature: None,
            }))
            .await;
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["tree"]["text"], "Understand galaxy evolution");
        assert_eq!(json["tree"]["children"][0]["text"], "child");
        assert_eq!(json["report"]["generation_calls"], 3);
        assert_eq!(json["report"]["failures"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn expand_rejects_zero_branching() {
        let out = service()
            .scitree_expand(Parameters(ExpandRequest {
                goal: "goal".into(),
                year_cutoff: None,
                branching_factor: Some(0),
                temperature: None,
            }))
            .await;
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(json["error"].as_str().unwrap().contains("branching factor"));
    }
}
