//! Recursive, concurrent, cancellable tree expansion.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;

use scitree_client::{CompletionRequest, GenerationClient};
use scitree_core::{DateCutoff, Result, ScitreeError, Settings};
use scitree_parser::parse_delimited_entries;
use scitree_query::{RetrievalEngine, RetrieveOptions};

use crate::cancel::CancellationToken;
use crate::mode::Mode;
use crate::node::TreeNode;
use crate::prompt::{input_block, persona, system_prompt};

/// Model parameters shared by every node of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeConfig {
    pub generation_model: String,
    pub max_tokens: usize,
    /// Documents retrieved per node.
    pub top_k: usize,
}

impl TreeConfig {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            generation_model: settings.models.generation.clone(),
            max_tokens: settings.generation.max_tokens,
            top_k: settings.generation.top_k,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Parameters of one expansion run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionRequest {
    pub root_text: String,
    pub year_cutoff: i32,
    /// Maximum children per node (n).
    pub branching_factor: usize,
    pub temperature: f32,
    pub background: Option<String>,
    pub experiment: Option<String>,
}

impl ExpansionRequest {
    /// Request with the default branching factor (2) and temperature (0.5).
    #[must_use]
    pub fn new(root_text: impl Into<String>, year_cutoff: i32) -> Self {
        Self {
            root_text: root_text.into(),
            year_cutoff,
            branching_factor: 2,
            temperature: 0.5,
            background: None,
            experiment: None,
        }
    }
}

/// Which step of a node's expansion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Credential,
    Retrieval,
    Generation,
}

/// A node that kept its text but got no children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchFailure {
    /// Child indices from the root to the failed node.
    pub path: Vec<usize>,
    pub text: String,
    pub mode: Mode,
    pub kind: FailureKind,
    pub error: String,
}

/// Diagnostics collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpansionReport {
    pub failures: Vec<BranchFailure>,
    /// Response lines without a usable `{…}` entry.
    pub skipped_lines: usize,
    /// Well-formed entries dropped because a response exceeded n.
    pub overflow_entries: usize,
    pub generation_calls: usize,
    pub cancelled: bool,
}

/// Result of an expansion: the tree plus its report.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub root: TreeNode,
    pub report: ExpansionReport,
}

/// Builds science trees from a root goal.
pub struct TreeEngine {
    retrieval: Arc<RetrievalEngine>,
    generator: Arc<dyn GenerationClient>,
    config: TreeConfig,
}

impl std::fmt::Debug for TreeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeEngine")
            .field("retrieval", &self.retrieval)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Per-run state shared by all branches.
struct Run<'a> {
    request: &'a ExpansionRequest,
    persona: String,
    cutoff: DateCutoff,
    cancel: &'a CancellationToken,
    failures: Mutex<Vec<BranchFailure>>,
    skipped: AtomicUsize,
    overflow: AtomicUsize,
    calls: AtomicUsize,
}

impl Run<'_> {
    fn record_failure(&self, failure: BranchFailure) {
        tracing::warn!(
            path = ?failure.path,
            mode = %failure.mode,
            kind = ?failure.kind,
            error = %failure.error,
            "branch failed; keeping node without children"
        );
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(failure);
        }
    }

    fn into_report(self) -> ExpansionReport {
        let mut failures = self.failures.into_inner().unwrap_or_else(|e| e.into_inner());
        failures.sort_by(|a, b| a.path.cmp(&b.path));
        ExpansionReport {
            failures,
            skipped_lines: self.skipped.into_inner(),
            overflow_entries: self.overflow.into_inner(),
            generation_calls: self.calls.into_inner(),
            cancelled: self.cancel.is_cancelled(),
        }
    }
}

/// Outcome of expanding one non-terminal node.
enum Step {
    Expanded {
        documents: Vec<String>,
        children: Vec<String>,
    },
    Failed {
        documents: Vec<String>,
        kind: FailureKind,
        error: ScitreeError,
    },
    Cancelled,
}

impl TreeEngine {
    pub fn new(
        retrieval: Arc<RetrievalEngine>,
        generator: Arc<dyn GenerationClient>,
        config: TreeConfig,
    ) -> Self {
        Self {
            retrieval,
            generator,
            config,
        }
    }

    #[must_use]
    pub fn retrieval(&self) -> &RetrievalEngine {
        &self.retrieval
    }

    /// Expand without cancellation or deadline.
    ///
    /// # Errors
    ///
    /// See [`TreeEngine::expand_with`].
    pub async fn expand(&self, request: &ExpansionRequest) -> Result<Expansion> {
        self.expand_with(request, &CancellationToken::new(), None).await
    }

    /// Expand `request.root_text` down to the terminal level.
    ///
    /// Branch failures are isolated and reported; a cancelled or timed-out
    /// branch is dropped. The root is always returned on success.
    ///
    /// # Errors
    ///
    /// Returns [`ScitreeError::Config`] for a zero branching factor and
    /// [`ScitreeError::Credential`] if the generation client is unconfigured
    /// or the root node fails on a credential.
    pub async fn expand_with(
        &self,
        request: &ExpansionRequest,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<Expansion> {
        if request.branching_factor == 0 {
            return Err(ScitreeError::Config(
                "branching factor must be at least 1".to_string(),
            ));
        }
        if !self.generator.is_configured() {
            return Err(ScitreeError::Credential(
                "generation client has no API key".to_string(),
            ));
        }

        let started = Instant::now();
        let run = Run {
            request,
            persona: persona(request.background.as_deref(), request.experiment.as_deref()),
            cutoff: DateCutoff::from_year(request.year_cutoff),
            cancel,
            failures: Mutex::new(Vec::new()),
            skipped: AtomicUsize::new(0),
            overflow: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        };
        tracing::info!(
            root = %request.root_text,
            n = request.branching_factor,
            cutoff = %run.cutoff.coarse_stamp(),
            "expanding science tree"
        );

        let timer = timeout.map(|limit| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "expansion timed out");
                token.cancel();
            })
        });

        let root = self
            .build(&run, request.root_text.clone(), Mode::ScienceGoal, Vec::new())
            .await;
        if let Some(timer) = timer {
            timer.abort();
        }

        let root = root?.unwrap_or_else(|| {
            TreeNode::new(request.root_text.clone(), Mode::ScienceGoal, request.year_cutoff)
        });
        let report = run.into_report();
        tracing::info!(
            nodes = root.node_count(),
            failures = report.failures.len(),
            skipped_lines = report.skipped_lines,
            cancelled = report.cancelled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "science tree complete"
        );
        Ok(Expansion { root, report })
    }

    /// Build the subtree rooted at `text`. `Ok(None)` means the branch was
    /// cancelled; `Err` only escapes for a credential failure at the root.
    fn build<'a>(
        &'a self,
        run: &'a Run<'a>,
        text: String,
        mode: Mode,
        path: Vec<usize>,
    ) -> BoxFuture<'a, Result<Option<TreeNode>>> {
        async move {
            let mut node = TreeNode::new(text, mode, run.request.year_cutoff);
            let Some(next) = mode.next() else {
                return Ok(Some(node));
            };
            if run.cancel.is_cancelled() {
                return Ok(None);
            }

            match self.step(run, &node.text, mode).await {
                Step::Cancelled => Ok(None),
                Step::Failed {
                    documents,
                    kind,
                    error,
                } => {
                    if path.is_empty() && kind == FailureKind::Credential {
                        return Err(error);
                    }
                    node.documents = documents;
                    run.record_failure(BranchFailure {
                        path,
                        text: node.text.clone(),
                        mode,
                        kind,
                        error: error.to_string(),
                    });
                    Ok(Some(node))
                }
                Step::Expanded {
                    documents,
                    children,
                } => {
                    node.documents = documents;
                    let branches = children.into_iter().enumerate().map(|(i, child)| {
                        let mut child_path = path.clone();
                        child_path.push(i);
                        self.build(run, child, next, child_path)
                    });
                    for child in join_all(branches).await {
                        if let Some(child) = child? {
                            node.children.push(child);
                        }
                    }
                    Ok(Some(node))
                }
            }
        }
        .boxed()
    }

    /// Retrieve grounding documents, ask for children, parse the reply.
    async fn step(&self, run: &Run<'_>, text: &str, mode: Mode) -> Step {
        let n = run.request.branching_factor;
        let opts = RetrieveOptions::top_k(self.config.top_k).with_cutoff(run.cutoff);

        let retrieved = tokio::select! {
            biased;
            () = run.cancel.cancelled() => return Step::Cancelled,
            r = self.retrieval.retrieve(text, &opts) => r,
        };
        let ids = match retrieved {
            Ok(ids) => ids,
            Err(error) => {
                let kind = if error.is_credential() {
                    FailureKind::Credential
                } else {
                    FailureKind::Retrieval
                };
                return Step::Failed {
                    documents: Vec::new(),
                    kind,
                    error,
                };
            }
        };
        let texts = self.retrieval.get_document_texts(&ids);
        let documents: Vec<String> = texts.iter().map(|t| t.id.clone()).collect();

        let Some(system) = system_prompt(&run.persona, mode, n) else {
            return Step::Expanded {
                documents,
                children: Vec::new(),
            };
        };
        let user = input_block(mode, text, &texts);
        let request = CompletionRequest {
            system: &system,
            user: &user,
            model: &self.config.generation_model,
            temperature: run.request.temperature,
            max_tokens: self.config.max_tokens,
        };

        run.calls.fetch_add(1, Ordering::Relaxed);
        let reply = tokio::select! {
            biased;
            () = run.cancel.cancelled() => return Step::Cancelled,
            r = self.generator.complete(&request) => r,
        };
        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                let error = ScitreeError::from(e);
                let kind = if error.is_credential() {
                    FailureKind::Credential
                } else {
                    FailureKind::Generation
                };
                return Step::Failed {
                    documents,
                    kind,
                    error,
                };
            }
        };

        let parsed = parse_delimited_entries(&reply, n);
        run.skipped.fetch_add(parsed.skipped, Ordering::Relaxed);
        run.overflow.fetch_add(parsed.overflow, Ordering::Relaxed);
        tracing::debug!(
            mode = %mode,
            documents = documents.len(),
            children = parsed.entries.len(),
            skipped = parsed.skipped,
            overflow = parsed.overflow,
            "node expanded"
        );
        Step::Expanded {
            documents,
            children: parsed.entries,
        }
    }
}
