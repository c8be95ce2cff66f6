//! Tool trait — the abstraction over domain operations.
//!
//! One tool serves one intent and is registered under the intent's wire
//! name. Tools report outcomes as text because the reply goes straight back
//! into a conversation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::ToolError;
use crate::intent::{Args, Intent};

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the requested effect happened
    pub success: bool,

    /// Human-readable outcome, shown to the user as-is
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    /// The operation was refused (bad arguments, domain rule).
    pub fn rejected(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Static description of a tool: its name and the argument keys it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub required_args: Vec<String>,
}

/// The core Tool trait.
///
/// `execute` only ever receives the keys listed in `required_args`; absent
/// keys are simply missing from the map.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool, equal to an intent's wire name.
    fn name(&self) -> &str;

    /// A description of what this tool does.
    fn description(&self) -> &str;

    /// Argument keys this tool reads, in declaration order.
    fn required_args(&self) -> &'static [&'static str];

    /// Execute the tool with the given arguments.
    ///
    /// Bad arguments and domain violations are `Ok` with a rejection text.
    /// `Err` is reserved for an unreachable store.
    async fn execute(&self, arguments: Args) -> std::result::Result<ToolResult, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            required_args: self.required_args().iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A registry of available tools, keyed by name.
///
/// Built once at startup and shared read-only afterwards.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// The tool serving `intent`, if one is registered.
    pub fn for_intent(&self, intent: Intent) -> Option<&dyn Tool> {
        self.get(intent.as_str())
    }

    /// Specs of all registered tools, sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
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
