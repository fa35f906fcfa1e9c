//! Generation client abstractions with offline fallback.
//!
//! This crate provides uniform access to a hosted language model:
//!
//! - [`Generator`] — Strategy trait: `generate(messages, tools)` returns text or a tool call
//! - [`LlmClient`] — OpenAI-compatible remote generator (DashScope compatible mode by default)
//! - [`CannedGenerator`] — Deterministic offline strategy with rotating placeholder answers
//! - [`ScriptedGenerator`] — Replays a scripted list of outcomes (for tests and demos)
//! - [`GenerationClient`] — Recommended: wraps a primary and a fallback, never fails
//! - [`TraceSink`] — Best-effort telemetry for every generation call
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mentor_config::MentorConfig;
//! use mentor_core::Message;
//! use mentor_llm::{GenerationClient, GenerationOutcome};
//!
//! let config = MentorConfig::from_env()?;
//! // Without DASHSCOPE_API_KEY this silently selects the offline strategy.
//! let client = GenerationClient::from_settings(&config.llm, &config.tracing);
//!
//! let generation = client.generate(&[Message::user("Hello!")], &[]).await;
//! if let GenerationOutcome::Text(text) = generation.outcome {
//!     println!("{} ({:?})", text, generation.mode);
//! }
//! ```
//!
//! # Tool Calling
//!
//! ```rust,ignore
//! let tools = vec![ToolSchema {
//!     name: "system_info".to_string(),
//!     description: "Read CPU, memory, disk and today's date".to_string(),
//!     parameters: serde_json::json!({ "type": "object", "properties": {} }),
//! }];
//!
//! match client.generate(&messages, &tools).await.outcome {
//!     GenerationOutcome::Text(text) => println!("{}", text),
//!     GenerationOutcome::ToolCall(call) => println!("call {}({})", call.name, call.arguments),
//! }
//! ```

mod client;
mod offline;
mod trace;
mod unified;

use async_trait::async_trait;
use mentor_core::{AgentError, Message};

pub use client::LlmClient;
pub use mentor_core::{ToolCallRequest, ToolResult, ToolSchema};
pub use offline::{CannedGenerator, ScriptedGenerator, DEFAULT_CANNED_RESPONSES};
pub use trace::{
    trace_sink_from_settings, HttpTraceSink, LogTraceSink, NoopTraceSink, TraceRecord, TraceSink,
};
pub use unified::{Generation, GenerationClient, GenerationMode, UNAVAILABLE_ANSWER};

/// What a generator produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// A free-text answer.
    Text(String),
    /// The model asks the caller to run a tool.
    ToolCall(ToolCallRequest),
}

impl GenerationOutcome {
    /// Returns the text if this outcome is a text answer.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Text(text) => Some(text),
            GenerationOutcome::ToolCall(_) => None,
        }
    }
}

/// A strategy that turns an ordered message list into a [`GenerationOutcome`].
///
/// The remote client, the offline canned generator and scripted test
/// generators all implement this trait, so they are interchangeable behind
/// [`GenerationClient`].
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short name used in logs and trace records.
    fn name(&self) -> &str;

    /// Produces text or a tool call for the given conversation.
    ///
    /// `messages` must be non-empty; `tools` may be empty.
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<GenerationOutcome, AgentError>;
}
