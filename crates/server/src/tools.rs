//! The two MCP tools: semantic search and category listing.
//!
//! Query-time failures (embedding backend down, index unreachable) are
//! returned as inline error results so the long-lived MCP session is never
//! torn down by one failed query.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use docvec_index::{CategoryCount, FragmentHit, Store};
use docvec_mcp::{Tool, ToolDefinition, ToolError, ToolOutput};

use crate::provider::EmbedderProvider;
use crate::retriever::{similarity, Retriever};

const DEFAULT_TOP_K: usize = 5;
const MAX_TOP_K: usize = 20;

// ── search_docs ─────────────────────────────────────────────────────

pub struct SearchTool {
    provider: Arc<EmbedderProvider>,
    database_url: String,
    retriever: Retriever,
}

impl SearchTool {
    pub fn new(provider: Arc<EmbedderProvider>, database_url: String, retriever: Retriever) -> Self {
        Self {
            provider,
            database_url,
            retriever,
        }
    }
}

#[derive(Debug, PartialEq)]
struct SearchArgs {
    query: String,
    category: Option<String>,
    top_k: usize,
}

fn parse_search_args(arguments: &Value) -> Result<SearchArgs, ToolError> {
    let query = arguments
        .get("query")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ToolError::InvalidInput("missing 'query' field".to_string()))?
        .to_string();

    let category = arguments
        .get("category")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let top_k = arguments
        .get("top_k")
        .and_then(|v| v.as_u64())
        .map(|k| (k as usize).clamp(1, MAX_TOP_K))
        .unwrap_or(DEFAULT_TOP_K);

    Ok(SearchArgs {
        query,
        category,
        top_k,
    })
}

fn format_results(query: &str, hits: &[FragmentHit]) -> String {
    let mut parts = vec![format!("## Results for: {query}\n")];
    for (i, hit) in hits.iter().enumerate() {
        let percent = similarity(hit.distance) * 100.0;
        parts.push(format!(
            "### [{}] {} - {} ({}, {:.1}% match)\n\n{}",
            i + 1,
            hit.source_file,
            hit.category,
            hit.kind.label(),
            percent,
            hit.text
        ));
    }
    parts.join("\n\n---\n\n")
}

fn no_results_message(query: &str, category: Option<&str>) -> String {
    match category {
        Some(c) => format!("No results for \"{query}\" in category \"{c}\"."),
        None => format!("No results found for \"{query}\"."),
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_docs".to_string(),
            description: "Search the documentation index with a semantic query. \
                          Returns the most relevant documentation fragments, each \
                          with its source file, category, and a similarity score. \
                          Use list_categories to discover filterable categories."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Question or phrase to search for"
                    },
                    "category": {
                        "type": "string",
                        "description": "Restrict results to one category. \
                                        See list_categories for the options."
                    },
                    "top_k": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 20,
                        "default": 5,
                        "description": "Number of results to return (default: 5)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args = parse_search_args(&arguments)?;
        tracing::info!(
            query = %args.query,
            category = args.category.as_deref().unwrap_or("all"),
            top_k = args.top_k,
            "search_docs"
        );

        let query_vec = match self.provider.embed_query(&args.query).await {
            Ok(v) => v,
            Err(e) => {
                return Ok(ToolOutput::error(format!(
                    "Failed to generate the query embedding: {e}"
                )))
            }
        };

        // One read-only connection per request, dropped on return.
        let mut store = match Store::connect(&self.database_url).await {
            Ok(s) => s,
            Err(e) => return Ok(ToolOutput::error(format!("Failed to open the index: {e}"))),
        };

        let hits = match self
            .retriever
            .search(&mut store, &query_vec, args.category.as_deref(), args.top_k)
            .await
        {
            Ok(hits) => hits,
            Err(e) => return Ok(ToolOutput::error(format!("Failed to query the index: {e}"))),
        };

        if hits.is_empty() {
            return Ok(ToolOutput::text(no_results_message(
                &args.query,
                args.category.as_deref(),
            )));
        }

        Ok(ToolOutput::text(format_results(&args.query, &hits)))
    }
}

// ── list_categories ─────────────────────────────────────────────────

pub struct ListCategoriesTool {
    database_url: String,
}

impl ListCategoriesTool {
    pub fn new(database_url: String) -> Self {
        Self { database_url }
    }
}

fn format_categories(counts: &[CategoryCount]) -> String {
    let total: i64 = counts.iter().map(|c| c.total).sum();
    let mut lines = vec!["## Available documentation categories\n".to_string()];
    for count in counts {
        lines.push(format!(
            "- **{}** - {} fragments indexed",
            count.category, count.total
        ));
    }
    lines.push(format!(
        "\n_Total: {} fragments in {} categories._",
        total,
        counts.len()
    ));
    lines.join("\n")
}

#[async_trait]
impl Tool for ListCategoriesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_categories".to_string(),
            description: "List every documentation category in the index with its \
                          fragment count. Useful before search_docs to narrow a \
                          search to one area."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutput, ToolError> {
        let mut store = match Store::connect(&self.database_url).await {
            Ok(s) => s,
            Err(e) => return Ok(ToolOutput::error(format!("Failed to open the index: {e}"))),
        };

        let counts = match store.category_counts().await {
            Ok(c) => c,
            Err(e) => return Ok(ToolOutput::error(format!("Failed to query the index: {e}"))),
        };

        if counts.is_empty() {
            return Ok(ToolOutput::text(
                "Index is empty - no categories found.".to_string(),
            ));
        }

        Ok(ToolOutput::text(format_categories(&counts)))
    }
}
