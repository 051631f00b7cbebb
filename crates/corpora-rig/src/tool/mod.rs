//! Agent tools.
//!
//! A [`Tool`] exposes a named operation with a declared parameter schema.
//! Tools are collected into a [`ToolSet`], which validates arguments
//! against each tool's schema before dispatch. Execution failures,
//! including calls to unknown tools, are reported as failed outcomes
//! rather than errors so the agent loop can feed them back to the model.

mod function;
mod param;
mod query;

use std::collections::HashMap;
use std::sync::Arc;

pub use function::FunctionTool;
pub use param::{ParamSpec, Parameters};
pub use query::QueryTool;

use async_trait::async_trait;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, TRACING_TARGET};

/// A named operation the agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// Human-readable description presented to the model.
    fn description(&self) -> &str;

    /// Declared parameters.
    fn parameters(&self) -> Parameters;

    /// Executes the tool with validated arguments.
    async fn call(&self, args: serde_json::Value) -> Result<String>;
}

/// Model-facing tool definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: serde_json::Value,
}

/// Outcome of a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// Whether execution succeeded.
    pub success: bool,
    /// Tool output on success, or an error description.
    pub content: String,
}

impl ToolOutcome {
    fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
        }
    }

    fn failure(content: impl Into<String>) -> Self {
        Self {
            success: false,
            content: content.into(),
        }
    }
}

struct ToolEntry {
    tool: Arc<dyn Tool>,
    definition: ToolDefinition,
    validator: Validator,
}

/// A collection of tools with unique names.
#[derive(Default)]
pub struct ToolSet {
    entries: HashMap<String, ToolEntry>,
    order: Vec<String>,
}

impl ToolSet {
    /// Creates an empty tool set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// Fails if a tool with the same name is already registered, its
    /// parameters declare a duplicate name, or its schema is invalid.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.entries.contains_key(&name) {
            return Err(Error::tool(&name, "a tool with this name is already registered"));
        }

        let declared = tool.parameters();
        if let Some(duplicate) = declared.duplicate_name() {
            return Err(Error::tool(
                &name,
                format!("parameter '{duplicate}' is declared more than once"),
            ));
        }

        let parameters = declared.to_json_schema();
        let validator = Validator::new(&parameters)
            .map_err(|e| Error::tool(&name, format!("invalid parameter schema: {e}")))?;
        let definition = ToolDefinition {
            name: name.clone(),
            description: tool.description().to_string(),
            parameters,
        };

        self.entries.insert(
            name.clone(),
            ToolEntry {
                tool,
                definition,
                validator,
            },
        );
        self.order.push(name);
        Ok(())
    }

    /// Returns all tool definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| entry.definition.clone())
            .collect()
    }

    /// Returns whether a tool with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Executes a tool by name.
    ///
    /// Unknown tools, schema violations, and execution errors all yield a
    /// failed outcome describing the problem.
    pub async fn execute(&self, name: &str, args: serde_json::Value) -> ToolOutcome {
        let Some(entry) = self.entries.get(name) else {
            tracing::warn!(
                target: TRACING_TARGET,
                tool = %name,
                "Unknown tool requested"
            );
            return ToolOutcome::failure(format!("tool '{name}' not found"));
        };

        let violations: Vec<String> = entry
            .validator
            .iter_errors(&args)
            .map(|e| e.to_string())
            .collect();
        if !violations.is_empty() {
            return ToolOutcome::failure(format!(
                "invalid arguments for '{name}': {}",
                violations.join("; ")
            ));
        }

        match entry.tool.call(args).await {
            Ok(content) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    tool = %name,
                    "Tool executed"
                );
                ToolOutcome::success(content)
            }
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    tool = %name,
                    error = %e,
                    "Tool execution failed"
                );
                ToolOutcome::failure(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet").field("tools", &self.order).finish()
    }
}
