//! docvec-server -- MCP server answering semantic documentation queries.
//!
//! Speaks JSON-RPC over stdio. All logging goes to stderr: stdout belongs
//! to the protocol and a stray print there corrupts the session.

mod provider;
mod retriever;
mod tools;

use std::sync::Arc;

use anyhow::{Context, Result};

use docvec_core::config::{load_dotenv, Config};
use docvec_mcp::{McpServer, StdioTransport, ToolRegistry};

use crate::provider::EmbedderProvider;
use crate::retriever::Retriever;
use crate::tools::{ListCategoriesTool, SearchTool};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::from_env();
    config.log_summary();

    let provider = Arc::new(EmbedderProvider::new(config.embedding.clone()));
    let retriever = Retriever::new(config.search.over_fetch);

    let mut registry = ToolRegistry::new();
    registry
        .register(SearchTool::new(
            provider,
            config.database.url.clone(),
            retriever,
        ))
        .context("failed to register search_docs")?;
    registry
        .register(ListCategoriesTool::new(config.database.url.clone()))
        .context("failed to register list_categories")?;

    let mut server = McpServer::new(registry).with_name("docvec-docs");
    let mut transport = StdioTransport::new();
    server
        .run(&mut transport)
        .await
        .context("MCP server terminated with an error")?;

    Ok(())
}
