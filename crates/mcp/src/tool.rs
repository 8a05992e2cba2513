//! The tool seam the MCP server dispatches into.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Describes a tool's interface for the client: name, human-readable
/// description, and a JSON Schema for its arguments.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// What a tool hands back. `is_error` marks an inline failure -- the
/// session stays alive and the text explains what went wrong.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// An inline failure result. Used for expected query-time failures
    /// (embedding or index errors) that must not kill the session.
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// The extension point: every MCP-exposed operation implements this.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's definition (name, description, JSON Schema).
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON arguments.
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError>;
}

/// Holds the registered tools and resolves them by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Rejects duplicate names.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let def = tool.definition();
        if self.tools.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        self.tools.insert(def.name, Arc::new(tool));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All registered tool definitions.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool with name '{0}' is already registered")]
    DuplicateName(String),
}

/// Echoes its input back. Test scaffolding for the server loop.
#[doc(hidden)]
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "echo".to_string(),
            description: "Echoes back the input message.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" }
                },
                "required": ["message"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let message = arguments
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'message' field".to_string()))?;
        Ok(ToolOutput::text(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        assert!(registry.register(EchoTool).is_err());
    }

    #[tokio::test]
    async fn echo_roundtrip() {
        let result = EchoTool
            .execute(serde_json::json!({"message": "hello"}))
            .await
            .unwrap();
        assert_eq!(result.content, "hello");
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn echo_rejects_missing_field() {
        let err = EchoTool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
