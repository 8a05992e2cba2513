//! MCP (Model Context Protocol) server plumbing for docvec.
//!
//! Implements the server half of MCP over JSON-RPC 2.0: newline-delimited
//! JSON messages on a pluggable transport (stdio in production), dispatched
//! to tools registered in a `ToolRegistry`.
//!
//! - **types**: JSON-RPC 2.0 and MCP protocol types
//! - **transport**: `McpTransport` trait, stdio and in-memory channel impls
//! - **tool**: the `Tool` trait and registry the server dispatches into
//! - **server**: the request loop
//! - **error**: unified error types
//!
//! The loop is deliberately hard to kill: malformed JSON, unknown methods,
//! and failing tools all produce error *responses*, never a dead session.
//!
//! ```no_run
//! use docvec_mcp::{McpServer, StdioTransport, ToolRegistry};
//!
//! # async fn example() {
//! let registry = ToolRegistry::new();
//! let mut server = McpServer::new(registry).with_name("docvec");
//! let mut transport = StdioTransport::new();
//! server.run(&mut transport).await.unwrap();
//! # }
//! ```

pub mod error;
pub mod server;
pub mod tool;
pub mod transport;
pub mod types;

pub use error::McpError;
pub use server::McpServer;
pub use tool::{Tool, ToolDefinition, ToolError, ToolOutput, ToolRegistry};
pub use transport::{ChannelTransport, McpTransport, StdioTransport};
pub use types::*;
