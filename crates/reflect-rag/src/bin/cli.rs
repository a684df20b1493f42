//! ReflectCode command line
//!
//! - `ingest`: load a directory of .txt/.md/.pdf files into the vector index
//! - `ask`: run the reflection loop on a query
//! - `health`: check the model, embedder and index

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reflect_rag::{
    ingestion::IngestPipeline,
    presentation::{render_full_trace, render_markdown, render_review_pdf},
    ReflectConfig, ReflectRequest, ReviewMode, SelfRag, Services,
};

#[derive(Parser)]
#[command(name = "reflect-rag")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Self-reflective RAG code reviewer", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "REFLECT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load source documents into the vector index
    Ingest {
        /// Directory of .txt, .md and .pdf files
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,
    },

    /// Run the reflection loop on a query
    Ask {
        /// The question or review request
        #[arg(short, long)]
        query: String,

        /// Critique audience
        #[arg(short, long, value_enum, default_value_t = ReviewMode::Dev)]
        mode: ReviewMode,

        /// Target role (recruiter mode)
        #[arg(short, long, default_value = "")]
        role: String,

        /// File whose contents are attached as a code snippet
        #[arg(long)]
        code_file: Option<PathBuf>,

        /// Write the recruiter review PDF here
        #[arg(long)]
        pdf_out: Option<PathBuf>,

        /// Print every trace step instead of the summary
        #[arg(long)]
        full_trace: bool,
    },

    /// Check that the configured services are reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "reflect_rag=debug"
    } else {
        "reflect_rag=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ReflectConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let services = Services::from_config(&config).context("Failed to initialize services")?;

    let outcome = run(cli.command, &config, &services).await;
    services.shutdown().await.context("Failed to flush vector store")?;
    outcome
}

async fn run(command: Commands, config: &ReflectConfig, services: &Services) -> Result<()> {
    match command {
        Commands::Ingest { data_dir } => {
            let pipeline = IngestPipeline::new(
                &config.chunking,
                services.embedder.clone(),
                services.vector_store.clone(),
            );
            let report = pipeline
                .ingest_dir(&data_dir)
                .await
                .with_context(|| format!("Ingestion of {} failed", data_dir.display()))?;

            println!(
                "Loaded {} files ({} skipped), created {} chunks",
                report.files_loaded, report.files_skipped, report.chunks_created
            );
        }

        Commands::Ask {
            query,
            mode,
            role,
            code_file,
            pdf_out,
            full_trace,
        } => {
            if query.trim().is_empty() {
                bail!("--query must not be empty");
            }

            let mut request = ReflectRequest::new(query, mode).with_role(role);
            if let Some(path) = code_file {
                let code = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                request = request.with_code_snippet(code);
            }

            let pipeline = SelfRag::new(services, config.retrieval.top_k);
            let result = pipeline.run(&request).await?;

            if full_trace {
                println!("{}", render_full_trace(&result));
            } else {
                println!("{}", render_markdown(&result));
            }

            if let Some(path) = pdf_out {
                match render_review_pdf(&request.effective_query(), &result)? {
                    Some(bytes) => {
                        std::fs::write(&path, bytes)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        println!("\nReview PDF written to {}", path.display());
                    }
                    None => eprintln!("No PDF written: only recruiter mode produces a review"),
                }
            }
        }

        Commands::Health => {
            let health = services.health().await;
            println!("LLM ({}):          {}", services.llm.name(), status(health.llm));
            println!("Embedder ({}):     {}", services.embedder.name(), status(health.embedder));
            println!(
                "Vector store ({}): {}",
                services.vector_store.name(),
                status(health.vector_store)
            );
            if health.vector_store {
                println!("Indexed chunks:    {}", services.vector_store.len().await?);
            }
            if !health.all_healthy() {
                bail!("one or more services are unavailable");
            }
        }
    }
    Ok(())
}

fn status(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "unavailable"
    }
}
