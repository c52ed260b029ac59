//! Tool Executor port
//!
//! Defines the interface for the deterministic analysis tools (impact
//! estimates, opinion simulation, risk scoring, ...).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Description of a tool, in the shape function-calling APIs expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object
    pub parameters: Value,
}

/// Port for tool execution
///
/// Tools never fail: an unknown tool or bad arguments yield an
/// `{"error": ...}` object.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Schemas of all available tools
    fn schemas(&self) -> Vec<ToolSchema>;

    /// Check if a tool is available
    fn has_tool(&self, name: &str) -> bool {
        self.schemas().iter().any(|s| s.name == name)
    }

    /// Execute a tool by name with a flat argument map
    async fn execute(&self, name: &str, arguments: &Map<String, Value>) -> Value;
}

/// Executor with no tools
pub struct NoToolExecutor;

#[async_trait]
impl ToolExecutorPort for NoToolExecutor {
    fn schemas(&self) -> Vec<ToolSchema> {
        Vec::new()
    }

    async fn execute(&self, name: &str, _arguments: &Map<String, Value>) -> Value {
        serde_json::json!({ "error": format!("unknown tool: {}", name) })
    }
}
