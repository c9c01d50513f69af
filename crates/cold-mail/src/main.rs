mod api;
mod compose;
mod config;
mod error;
mod extract;
mod fetch;
mod mailto;
mod matcher;
mod model;
mod pipeline;
mod portfolio;
mod prompts;
mod server;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use outreach_common::embedding::{Embedder, TextEmbedder};
use outreach_common::openai::{OpenAiClient, OpenAiClientConfig};
use outreach_common::vectordb::VectorDb;

use compose::EmailComposer;
use config::Config;
use extract::JobExtractor;
use fetch::PageFetcher;
use matcher::PortfolioMatcher;
use pipeline::OutreachPipeline;
use server::ColdMailServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting cold-mail MCP server");

    let config = Config::from_env()?;
    let openai_config = OpenAiClientConfig::from_env();
    info!(
        lancedb_path = %config.lancedb_path,
        builtin_portfolio = %config.builtin_portfolio.display(),
        model = %config.model,
        chat_base_url = %openai_config.base_url,
        "configuration loaded"
    );

    info!("initializing embedding model (may download on first run)");
    let embedder: Arc<dyn TextEmbedder> =
        Arc::new(Embedder::new(config.embedding_cache_dir.clone()).await?);
    info!("embedding model ready");

    let vectordb = Arc::new(VectorDb::connect(&config.lancedb_path).await?);
    info!("lancedb connected");

    let matcher = Arc::new(PortfolioMatcher::new(
        embedder,
        vectordb,
        config.builtin_portfolio.clone(),
    ));
    info!(rows = matcher.indexed_rows().await?, "portfolio index opened");

    let openai = OpenAiClient::new(openai_config)?;
    let pipeline = Arc::new(OutreachPipeline::new(
        PageFetcher::new(config.fetch_timeout)?,
        JobExtractor::new(openai.clone(), config.model.clone()),
        Arc::clone(&matcher),
        EmailComposer::new(openai, config.model),
    ));

    let server = ColdMailServer::new(pipeline, matcher);

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
