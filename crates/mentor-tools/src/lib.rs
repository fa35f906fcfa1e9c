//! Tool registry, dispatcher and built-in tools for mentor.
//!
//! This crate provides the tool abstraction for LLM function calling:
//!
//! - [`Tool`] — Trait for implementing tools
//! - [`ParamSpec`] — Declarative parameter schema, validated before execution
//! - [`ToolRegistry`] — Ordered registry; duplicate names are rejected
//! - [`ToolDispatcher`] — Runs a [`ToolCallRequest`] and always returns a [`ToolResult`]
//! - Built-ins: [`LearningPathTool`], [`SystemInfoTool`], [`CameraTool`], [`ShellTool`]
//!
//! # Implementing a Custom Tool
//!
//! ```rust,ignore
//! use mentor_tools::{ParamSpec, Tool, ToolError};
//! use async_trait::async_trait;
//!
//! struct TimerTool;
//!
//! #[async_trait]
//! impl Tool for TimerTool {
//!     fn name(&self) -> &str { "start_timer" }
//!     fn description(&self) -> &str { "Starts a countdown" }
//!     fn params(&self) -> Vec<ParamSpec> {
//!         vec![ParamSpec::integer("duration").describe("Seconds").min(0.0)]
//!     }
//!     async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
//!         Ok(serde_json::json!(format!("started {}s timer", args["duration"])))
//!     }
//! }
//! ```
//!
//! # Using the Registry
//!
//! ```rust,ignore
//! let mut registry = ToolRegistry::with_defaults(&ToolSettings::default())?;
//! registry.register(TimerTool)?; // DuplicateName if already present
//!
//! let dispatcher = ToolDispatcher::new(Arc::new(registry));
//! let result = dispatcher.dispatch(&call).await; // never fails
//! ```

mod camera;
mod dispatcher;
mod learning_path;
mod shell;
mod system_info;
mod validate;

pub use camera::{CameraTool, LaunchCandidate};
pub use dispatcher::ToolDispatcher;
pub use learning_path::LearningPathTool;
pub use shell::ShellTool;
pub use system_info::{format_bytes, SystemInfoTool, SystemOverview};
pub use validate::{validate_arguments, ParamSpec, ParamType};

use async_trait::async_trait;
use mentor_config::ToolSettings;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub use mentor_core::{ToolCallRequest, ToolFailure, ToolResult, ToolSchema};

/// Errors raised by the registry or by a tool.
#[derive(Error, Debug)]
pub enum ToolError {
    /// A tool with this name is already registered.
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),

    /// Requested tool was not found in the registry.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Invalid arguments were passed to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool execution failed with a message.
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Maps the error onto the failure class recorded in a [`ToolResult`].
    pub fn failure_kind(&self) -> ToolFailure {
        match self {
            ToolError::NotFound(_) => ToolFailure::NotFound,
            ToolError::InvalidArguments(_) => ToolFailure::InvalidArguments,
            ToolError::DuplicateName(_) | ToolError::ExecutionFailed(_) => ToolFailure::ExecutionFailed,
        }
    }
}

/// Trait for implementing tools that can be called by LLMs.
///
/// Tools are the bridge between LLM reasoning and host actions. Arguments
/// are validated against [`params`](Tool::params) before `execute` runs.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of this tool.
    fn name(&self) -> &str;

    /// Returns a description of what this tool does.
    fn description(&self) -> &str;

    /// Returns the parameters this tool accepts, in declaration order.
    fn params(&self) -> Vec<ParamSpec>;

    /// Executes the tool with validated arguments (always a JSON object).
    ///
    /// # Returns
    /// The tool's payload (text or structured), or an error.
    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError>;

    /// Returns the JSON Schema for this tool's parameters.
    fn parameters(&self) -> serde_json::Value {
        validate::params_to_schema(&self.params())
    }

    /// Generates the schema for this tool (default implementation).
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Registry of tools available to the router and dispatcher.
///
/// Registration order is preserved and is the order schemas are advertised
/// to the model. Built once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in tools.
    ///
    /// Includes:
    /// - `get_learning_path`, `system_info`, `run_shell` — Always available
    /// - `open_camera` — Unless disabled in settings
    pub fn with_defaults(settings: &ToolSettings) -> Result<Self, ToolError> {
        let mut registry = Self::new();

        registry.register(LearningPathTool)?;
        registry.register(SystemInfoTool)?;
        if settings.enable_camera {
            registry.register(CameraTool::for_current_platform())?;
        }
        registry.register(ShellTool::new(settings))?;

        Ok(registry)
    }

    /// Registers a tool; fails if the name is taken.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), ToolError> {
        self.register_arc(Arc::new(tool))
    }

    /// Registers an already shared tool; fails if the name is taken.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateName(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Gets a tool by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tools[i]))
    }

    /// Returns all tools in registration order.
    pub fn list_all(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Returns schemas for all registered tools, in registration order.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Returns true if a tool with the given name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the names of all registered tools, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool(&'static str);

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "Echoes its input"
        }
        fn params(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::string("text")]
        }
        async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
            Ok(args["text"].clone())
        }
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool("echo")).unwrap();
        let err = registry.register(EchoTool("echo")).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateName(ref n) if n == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_unknown_is_not_found() {
        let registry = ToolRegistry::new();
        assert!(matches!(registry.lookup("ghost"), Err(ToolError::NotFound(_))));
    }

    #[test]
    fn listing_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(EchoTool(name)).unwrap();
        }
        assert_eq!(registry.tool_names(), vec!["zeta", "alpha", "mid"]);
        let schemas = registry.schemas();
        assert_eq!(schemas[1].name, "alpha");
        assert_eq!(schemas[1].parameters["required"], json!(["text"]));
    }

    #[test]
    fn defaults_include_builtins() {
        let registry = ToolRegistry::with_defaults(&ToolSettings::default()).unwrap();
        assert_eq!(
            registry.tool_names(),
            vec!["get_learning_path", "system_info", "open_camera", "run_shell"]
        );

        let settings = ToolSettings { enable_camera: false, ..ToolSettings::default() };
        let registry = ToolRegistry::with_defaults(&settings).unwrap();
        assert!(!registry.has("open_camera"));
    }
}
