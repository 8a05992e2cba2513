//! docvec-ingest -- one-shot full rebuild of the documentation index.
//!
//! Pipeline: walk the docs tree → chunk Markdown → caption screenshots →
//! embed in batches → rebuild the vector index wholesale. Configuration
//! errors abort with a non-zero exit; a single failing image is logged and
//! skipped.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use docvec_core::config::{load_dotenv, Config};
use docvec_core::{EmbeddedFragment, Fragment};
use docvec_index::Store;
use docvec_ingest::chunker::{chunk_markdown, ChunkConfig};
use docvec_ingest::embedding::{create_embedder, EmbeddingBatcher};
use docvec_ingest::vision::ImageDescriber;
use docvec_ingest::walker::collect_sources;

// ── CLI ─────────────────────────────────────────────────────────────

/// Documentation ingestion pipeline: chunk, caption, embed, index.
#[derive(Parser, Debug)]
#[command(name = "docvec-ingest", version, about)]
struct Cli {
    /// Root of the documentation tree (top-level directories are categories).
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    /// Restrict ingestion to a single category. The rebuild is still
    /// wholesale: the resulting index contains only that category.
    #[arg(long)]
    category: Option<String>,

    /// Print statistics for the current index and exit.
    #[arg(long)]
    stats: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    if cli.stats {
        return show_stats(&config).await;
    }

    config.log_summary();
    let started = Instant::now();

    let docs_dir = cli.docs_dir.unwrap_or_else(|| config.ingest.docs_dir.clone());
    let sources = collect_sources(&docs_dir, cli.category.as_deref())
        .context("failed to collect documentation sources")?;
    info!(
        markdowns = sources.markdowns.len(),
        images = sources.images.len(),
        "sources collected"
    );

    // ── Chunk markdown files ────────────────────────────────────────
    let chunk_config = ChunkConfig {
        max_tokens: config.chunking.max_tokens,
        header_context: config.chunking.header_context,
    };

    let mut fragments: Vec<Fragment> = Vec::new();
    for md in &sources.markdowns {
        let text = match std::fs::read_to_string(&md.path) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %md.path.display(), error = %e, "failed to read markdown, skipping");
                continue;
            }
        };
        let chunks = chunk_markdown(&text, &md.file_name, &md.category, &chunk_config);
        info!(file = %md.file_name, category = %md.category, fragments = chunks.len(), "chunked");
        fragments.extend(chunks);
    }

    // ── Caption images ──────────────────────────────────────────────
    if !sources.images.is_empty() {
        let api_key = match &config.vision.openai_api_key {
            Some(key) => key.clone(),
            None => bail!(
                "{} images found but OPENAI_API_KEY is not set",
                sources.images.len()
            ),
        };
        let describer = ImageDescriber::new(
            api_key,
            config.vision.model.clone(),
            config.vision.openai_base_url.clone(),
        );

        for image in &sources.images {
            match describer.describe(image).await {
                Ok(fragment) => {
                    info!(
                        file = %image.file_name,
                        chars = fragment.text.len(),
                        "image described"
                    );
                    fragments.push(fragment);
                }
                Err(e) => {
                    warn!(file = %image.file_name, error = %e, "failed to describe image, skipping");
                }
            }
        }
    }

    if fragments.is_empty() {
        bail!(
            "no fragments produced from {} - check the docs directory layout",
            docs_dir.display()
        );
    }
    info!(total = fragments.len(), "fragments ready for embedding");

    // ── Embed in batches ────────────────────────────────────────────
    let embedder =
        create_embedder(&config.embedding).context("failed to create embedding backend")?;
    let mut batcher = EmbeddingBatcher::new(embedder, config.embedding.batch_size);

    let mut embedded: Vec<EmbeddedFragment> = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        if let Some(batch) = batcher.add(fragment).await.context("embedding batch failed")? {
            embedded.extend(batch);
            info!(embedded = embedded.len(), "batch embedded");
        }
    }
    embedded.extend(batcher.flush().await.context("embedding batch failed")?);
    info!(total = embedded.len(), "embeddings generated");

    // ── Rebuild the index ───────────────────────────────────────────
    let mut store = Store::connect(&config.database.url)
        .await
        .context("failed to connect to the index database")?;
    store
        .rebuild(&embedded)
        .await
        .context("index rebuild failed")?;

    for row in store.stats().await.context("failed to read index stats")? {
        info!(
            category = %row.category,
            kind = row.kind.as_str(),
            fragments = row.total,
            "indexed"
        );
    }

    info!(elapsed = ?started.elapsed(), "ingestion complete");
    Ok(())
}

/// Print fragment counts per category and kind for the current index.
async fn show_stats(config: &Config) -> Result<()> {
    let mut store = Store::connect(&config.database.url)
        .await
        .context("failed to connect to the index database")?;
    let rows = store.stats().await.context("failed to read index stats")?;

    if rows.is_empty() {
        println!("Index is empty - run docvec-ingest first.");
        return Ok(());
    }

    let mut total = 0;
    println!("{:<30} {:<20} {:>10}", "category", "kind", "fragments");
    for row in &rows {
        println!(
            "{:<30} {:<20} {:>10}",
            row.category,
            row.kind.as_str(),
            row.total
        );
        total += row.total;
    }
    println!("{:<30} {:<20} {:>10}", "TOTAL", "", total);
    Ok(())
}
