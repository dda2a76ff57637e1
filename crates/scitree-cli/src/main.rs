//! scitree CLI: literature-grounded science goal decomposition
//!
//! Commands: generate, search, show, serve, completions

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use scitree_client::Clients;
use scitree_core::{current_year, paper_url, DateCutoff, Settings};
use scitree_index::Corpus;
use scitree_query::{RetrievalEngine, RetrieveOptions, TemporalIntentAnalyzer};
use scitree_tree::{CancellationToken, ExpansionRequest, TreeConfig, TreeEngine, TreeRecord};

#[derive(Parser)]
#[command(name = "scitree")]
#[command(version)]
#[command(about = "Expand science goals into literature-grounded trees")]
struct Cli {
    /// Configuration file (default: ./scitree.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log run progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Expand a science goal into a tree
    #[command(alias = "g")]
    Generate(GenerateArgs),
    /// Retrieve the papers closest to a query
    #[command(alias = "s")]
    Search(SearchArgs),
    /// Print a saved tree
    Show {
        /// Tree file written by `generate --output`
        path: PathBuf,
        /// Print the JSON record instead of the outline
        #[arg(long)]
        json: bool,
    },
    /// Run the MCP server over stdio
    Serve,
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Root science goal
    goal: String,
    /// Latest publication year used for grounding (default: current year)
    #[arg(long)]
    year: Option<i32>,
    /// Maximum children per node
    #[arg(short = 'n', long, default_value_t = 2)]
    branching: usize,
    /// Generation temperature
    #[arg(long, default_value_t = 0.5)]
    temperature: f32,
    /// Persona prepended to every prompt
    #[arg(long)]
    background: Option<String>,
    /// Observatory description appended to the persona
    #[arg(long)]
    experiment: Option<String>,
    /// Abort the expansion after this many seconds, keeping finished branches
    #[arg(long)]
    timeout: Option<u64>,
    /// Write the tree record as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the JSON record instead of the outline
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct SearchArgs {
    query: String,
    /// Number of results
    #[arg(short = 'k', long, default_value_t = 10)]
    top_k: usize,
    /// Latest publication date: a year or an arXiv id (needs `filters.date: true`)
    #[arg(long)]
    cutoff: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    Settings::load(path).context("loading configuration")
}

fn build_engine(settings: &Settings) -> Result<TreeEngine> {
    let corpus = Corpus::load(&settings.corpus).context("loading corpus")?;
    let clients = Clients::from_settings(settings).context("building API clients")?;
    let analyzer = TemporalIntentAnalyzer::from_settings(Arc::clone(&clients.generator), settings);
    let retrieval =
        RetrievalEngine::from_settings(Arc::new(corpus), clients.embedder, analyzer, settings);
    Ok(TreeEngine::new(
        Arc::new(retrieval),
        clients.generator,
        TreeConfig::from_settings(settings),
    ))
}

async fn generate(settings: &Settings, args: GenerateArgs) -> Result<()> {
    let engine = build_engine(settings)?;
    let generation = &settings.generation;
    let request = ExpansionRequest {
        branching_factor: args.branching,
        temperature: args.temperature,
        background: args.background.or_else(|| generation.background.clone()),
        experiment: args.experiment.or_else(|| generation.experiment.clone()),
        ..ExpansionRequest::new(args.goal, args.year.unwrap_or_else(current_year))
    };
    let timeout = args
        .timeout
        .or(settings.limits.timeout_secs)
        .map(Duration::from_secs);

    let cancel = CancellationToken::new();
    let on_interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted; finishing with the branches built so far");
                cancel.cancel();
            }
        })
    };
    let expansion = engine.expand_with(&request, &cancel, timeout).await;
    on_interrupt.abort();
    let expansion = expansion.context("expanding science tree")?;

    let report = &expansion.report;
    for failure in &report.failures {
        eprintln!(
            "warning: {} '{}' has no children: {}",
            failure.mode, failure.text, failure.error
        );
    }
    if report.skipped_lines > 0 || report.overflow_entries > 0 {
        eprintln!(
            "note: skipped {} unparsable lines, dropped {} surplus entries",
            report.skipped_lines, report.overflow_entries
        );
    }
    if report.cancelled {
        eprintln!("note: expansion stopped early; unfinished branches were dropped");
    }

    let record = expansion.root.to_record();
    if let Some(path) = &args.output {
        record
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        eprintln!("Saved tree to {}", path.display());
    }
    if args.json {
        println!("{}", record.to_json()?);
    } else {
        print!("{}", record.outline());
    }
    Ok(())
}

async fn search(settings: &Settings, args: SearchArgs) -> Result<()> {
    let mut opts = RetrieveOptions::top_k(args.top_k);
    if let Some(raw) = &args.cutoff {
        let cutoff = DateCutoff::parse(raw).with_context(|| format!("invalid cutoff '{raw}'"))?;
        if !settings.filters.date {
            tracing::warn!("date cutoff ignored: set filters.date to true in the configuration");
        }
        opts = opts.with_cutoff(cutoff);
    }
    let engine = build_engine(settings)?;

    let retrieval = engine.retrieval();
    let hits = retrieval
        .retrieve_scored(&args.query, &opts)
        .await
        .context("retrieving documents")?;
    let documents = &retrieval.corpus().documents;

    if args.json {
        let json: Vec<serde_json::Value> = hits
            .iter()
            .map(|hit| {
                serde_json::json!({
                    "id": hit.id,
                    "section": hit.section,
                    "score": hit.score,
                    "url": paper_url(&hit.id),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for hit in &hits {
        let title = documents.get(&hit.id).map_or("", |d| d.title.as_str());
        println!("{:.4}  {:<11}  {:<20}  {title}", hit.score, hit.section.as_str(), hit.id);
    }
    Ok(())
}

fn show(path: &Path, json: bool) -> Result<()> {
    let record = TreeRecord::load(path).with_context(|| format!("reading {}", path.display()))?;
    if json {
        println!("{}", record.to_json()?);
    } else {
        print!("{}", record.outline());
    }
    Ok(())
}

async fn serve(settings: Settings) -> Result<()> {
    use rmcp::ServiceExt;

    let engine = build_engine(&settings)?;
    let service = scitree_mcp::ScitreeMcpService::new(Arc::new(engine), Arc::new(settings));
    tracing::info!("serving MCP over stdio");
    let running = service
        .serve(rmcp::transport::stdio())
        .await
        .context("starting MCP server")?;
    running.waiting().await.context("MCP server stopped")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "scitree", &mut io::stdout());
            Ok(())
        }
        Commands::Show { path, json } => show(&path, json),
        Commands::Generate(args) => {
            if args.branching == 0 {
                bail!("--branching must be at least 1");
            }
            let settings = load_settings(cli.config.as_deref())?;
            generate(&settings, args).await
        }
        Commands::Search(args) => {
            let settings = load_settings(cli.config.as_deref())?;
            search(&settings, args).await
        }
        Commands::Serve => serve(load_settings(cli.config.as_deref())?).await,
    }
}
