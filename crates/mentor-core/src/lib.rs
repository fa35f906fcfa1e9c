//! Core domain types and error definitions for mentor.
//!
//! This crate provides the fundamental types shared across the workspace:
//!
//! - [`AgentError`] — Error type for generation and workflow operations
//! - [`Message`], [`MessageRole`] and [`ConversationState`] — Conversation types
//! - [`ToolCallRequest`], [`ToolResult`], [`ToolSchema`] — Tool interaction types
//!
//! # Example
//!
//! ```rust
//! use mentor_core::{ConversationState, Message, MessageRole};
//!
//! let mut state = ConversationState::new();
//! state.push(Message::user("Hello!"));
//! state.push(Message::assistant("Hi, what would you like to learn?"));
//!
//! assert_eq!(state.len(), 2);
//! assert_eq!(state.turns()[0].role, MessageRole::User);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during generation or workflow execution.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Missing or invalid configuration (e.g. no API key).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote endpoint unreachable or timed out.
    #[error("Network error: {0}")]
    Network(String),

    /// LLM API request failed.
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// Failed to parse structured output from LLM.
    #[error("Failed to parse structured output: {0}")]
    ParseError(String),

    /// The caller passed an unusable request (e.g. no messages).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A workflow graph ran more steps than allowed.
    #[error("Graph '{graph}' exceeded the step limit of {max_steps}")]
    StepLimitExceeded { graph: String, max_steps: usize },

    /// No outgoing edge matched the current state.
    #[error("Graph '{graph}' has no matching edge out of '{node}'")]
    NoRoute { graph: String, node: String },

    /// A node was re-entered through an edge not marked as loop-back.
    #[error("Graph '{graph}' re-entered '{to}' from '{from}' without a loop-back edge")]
    UnexpectedCycle {
        graph: String,
        from: String,
        to: String,
    },

    /// The graph definition is malformed.
    #[error("Invalid graph '{graph}': {message}")]
    InvalidGraph { graph: String, message: String },

    /// A graph node failed while running.
    #[error("Node '{node}' failed: {message}")]
    NodeFailed { node: String, message: String },
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::ParseError(err.to_string())
    }
}

impl AgentError {
    /// Returns `true` for errors that mean a workflow could not settle on an answer.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            AgentError::StepLimitExceeded { .. }
                | AgentError::NoRoute { .. }
                | AgentError::UnexpectedCycle { .. }
        )
    }
}

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions for the model.
    System,
    /// Message from the user.
    User,
    /// Message from the assistant/LLM.
    Assistant,
    /// Output of a tool, fed back to the model.
    Tool,
}

/// A single message in a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Tool call the assistant requested in this turn, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCallRequest>,
    /// For tool messages, the id of the call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), tool_call: None, tool_call_id: None }
    }

    /// Creates a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::System, content)
    }

    /// Creates a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    /// Creates a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    /// Creates an assistant turn that requests a tool call.
    pub fn assistant_tool_call(call: ToolCallRequest) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: String::new(),
            tool_call: Some(call),
            tool_call_id: None,
        }
    }

    /// Creates a tool-result message answering the given call.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_call: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Ordered, append-only conversation history owned by one session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationState {
    turns: Vec<Message>,
}

impl ConversationState {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn to the end of the conversation.
    pub fn push(&mut self, message: Message) {
        self.turns.push(message);
    }

    /// Returns all turns in order.
    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    /// Returns the most recent turn.
    pub fn last(&self) -> Option<&Message> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

// ============================================================================
// Tool Types
// ============================================================================

/// A tool call requested by the LLM.
///
/// When the model elects to use a tool it returns the tool name and the
/// argument values it chose. The dispatcher validates them against the
/// registered parameter specs before anything runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Identifier for this call (used to match results).
    pub id: String,
    /// Name of the tool to execute.
    pub name: String,
    /// Arguments to pass to the tool (expected to be a JSON object).
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCallRequest {
    /// Creates a request with a generated-looking id derived from the tool name.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let name = name.into();
        Self { id: format!("call_{}", name), name, arguments }
    }
}

/// Why a tool call did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailure {
    /// The requested tool is not registered.
    NotFound,
    /// Arguments were missing, mistyped or out of range.
    InvalidArguments,
    /// The tool ran and failed (missing OS capability, permission denied, ...).
    ExecutionFailed,
}

/// Outcome of dispatching one tool call.
///
/// Immutable once produced; read through the accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    call_id: String,
    tool_name: String,
    success: bool,
    payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<ToolFailure>,
}

impl ToolResult {
    /// Creates a successful result.
    pub fn success(call: &ToolCallRequest, payload: serde_json::Value) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            payload,
            error: None,
            failure: None,
        }
    }

    /// Creates a failed result carrying the failure class and message.
    pub fn failure(call: &ToolCallRequest, failure: ToolFailure, error: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: false,
            payload: serde_json::Value::Null,
            error: Some(error.into()),
            failure: Some(failure),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn failure_kind(&self) -> Option<ToolFailure> {
        self.failure
    }

    /// Renders the result as the text fed back to the model.
    pub fn to_context(&self) -> String {
        if !self.success {
            return format!("ERROR: {}", self.error.as_deref().unwrap_or("unknown failure"));
        }
        match &self.payload {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// JSON schema describing a tool for LLM function calling.
///
/// This follows the OpenAI function calling format and is used
/// to inform the LLM about available tools and their parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique name of the tool (e.g., "system_info").
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}
