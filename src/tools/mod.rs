//! Tool system for the plan executor.
//!
//! Tools are the structured actions the generation client may request during
//! a plan step. Each tool parses its own arguments, performs a domain action,
//! and returns structured data that the executor merges into the execution
//! context.
//!
//! The registry is constructed once at startup, injected into the executor,
//! and read-only afterwards - safe to share across concurrent tasks.

mod analyze_job;
mod compliance;
mod search_candidates;

pub use analyze_job::{AnalyzeJobDescription, JobRequirements};
pub use compliance::{ComplianceReport, GenerateComplianceReport};
pub use search_candidates::SearchCandidates;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{FunctionDefinition, LlmClient, ToolDefinition};
use crate::sourcing::SourceConnector;

/// Information about a tool for display purposes.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Trait for implementing tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// A description of what this tool does.
    fn description(&self) -> &str;

    /// JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry (no built-in tools).
    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with the three domain tools wired to the given
    /// collaborators.
    pub fn with_defaults(
        llm: Arc<dyn LlmClient>,
        model: String,
        sources: Vec<Arc<dyn SourceConnector>>,
    ) -> Self {
        let mut registry = Self::empty();

        registry.register(Arc::new(SearchCandidates::new(sources)));
        registry.register(Arc::new(AnalyzeJobDescription::new(
            Arc::clone(&llm),
            model.clone(),
        )));
        registry.register(Arc::new(GenerateComplianceReport::new(llm, model)));

        tracing::info!("Tool registry ready with {} tools", registry.tools.len());
        registry
    }

    /// Register a tool under its own name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// List all available tools.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .values()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Check if a tool exists by name.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get tool schemas in LLM-compatible format.
    pub fn get_tool_schemas(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                tool_type: "function".to_string(),
                function: FunctionDefinition {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters_schema(),
                },
            })
            .collect()
    }

    /// Execute a tool by name.
    ///
    /// An unknown name is an error for this call only; the executor records
    /// it and keeps the plan going.
    pub async fn execute(&self, name: &str, args: Value) -> anyhow::Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;

        tool.execute(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Returns its arguments"
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, args: Value) -> anyhow::Result<Value> {
            Ok(args)
        }
    }

    #[tokio::test]
    async fn registry_dispatches_by_name() {
        let mut registry = ToolRegistry::empty();
        registry.register(Arc::new(Echo));

        assert!(registry.has_tool("echo"));
        let result = registry
            .execute("echo", serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(result["a"], 1);
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let registry = ToolRegistry::empty();
        let err = registry
            .execute("nope", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown tool"));
    }

    #[test]
    fn schemas_cover_registered_tools() {
        let mut registry = ToolRegistry::empty();
        registry.register(Arc::new(Echo));
        let schemas = registry.get_tool_schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].function.name, "echo");
        assert_eq!(schemas[0].tool_type, "function");
    }
}
