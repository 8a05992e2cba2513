//! Error types for the MCP crate.

use crate::types::{error_codes, JsonRpcError};

/// Errors that can occur while serving MCP requests.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Failed to parse JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Transport I/O error.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The requested method is not supported.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid parameters for a method.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// The requested tool is not registered.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
}

impl McpError {
    /// Convert to a JSON-RPC error object.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        let code = match self {
            McpError::JsonParse(_) => error_codes::PARSE_ERROR,
            McpError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            McpError::InvalidParams(_) | McpError::ToolNotFound(_) => error_codes::INVALID_PARAMS,
            McpError::Transport(_) => error_codes::INTERNAL_ERROR,
        };
        JsonRpcError {
            code,
            message: self.to_string(),
            data: None,
        }
    }
}
