//! Reflection server binary
//!
//! Run with: cargo run -p reflect-rag --bin reflect-rag-server
//! Set REFLECT_CONFIG to a TOML file to override defaults.

use reflect_rag::{config::ReflectConfig, server::ReflectServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reflect_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
+-----------------------------------------------------------+
|                        ReflectCode                        |
|        Self-RAG code reviewer: retrieve, critique,        |
|                       refine, repeat                      |
+-----------------------------------------------------------+
"#
    );

    let config_path = std::env::var("REFLECT_CONFIG").ok().map(PathBuf::from);
    let config = ReflectConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM: {:?} / {}", config.llm.backend, config.llm.resolved_model());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Vector store: {:?}", config.vector_db.backend);
    tracing::info!("  - Retrieval top_k: {}", config.retrieval.top_k);

    let server = ReflectServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/reflect      - Run the reflection loop");
    println!("  POST /api/reflect/pdf  - Recruiter review as PDF");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
