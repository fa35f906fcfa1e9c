//! # Mentor — tool-calling and retrieval tutor
//!
//! Mentor answers learner questions by routing each turn through a small
//! workflow graph: the model either answers directly, asks for a registered
//! tool, or the turn is sent through BM25 retrieval over a local corpus.
//! When no model is reachable every path degrades to a local answer.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mentor::prelude::*;
//!
//! let config = MentorConfig::from_env()?;
//! let assistant = Assistant::from_config(&config)?;
//!
//! let mut session = assistant.session();
//! let report = session.send("LangChain 的 memory 怎么学？", TurnOptions::default()).await;
//! println!("{} ({:?})", report.answer, report.mode);
//! ```
//!
//! ## Custom Tools
//!
//! ```rust,ignore
//! use mentor::prelude::*;
//!
//! struct StartTimer;
//!
//! #[async_trait::async_trait]
//! impl Tool for StartTimer {
//!     fn name(&self) -> &str { "start_timer" }
//!     fn description(&self) -> &str { "Starts a countdown" }
//!     fn params(&self) -> Vec<ParamSpec> {
//!         vec![ParamSpec::integer("duration").min(0.0)]
//!     }
//!     async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
//!         Ok(args)
//!     }
//! }
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(StartTimer)?;
//! ```
//!
//! ## Crate Structure
//!
//! | Crate | Description |
//! |-------|-------------|
//! | [`mentor_config`] | Layered settings (file, environment, defaults) |
//! | [`mentor_core`] | Error types, messages, tool call records |
//! | [`mentor_engine`] | Workflow graph, intent router, assistant sessions |
//! | [`mentor_llm`] | Generation client with offline fallback |
//! | [`mentor_retrieval`] | Tokenizer and BM25 index |
//! | [`mentor_tools`] | Tool registry, argument validation, built-in tools |
//!
//! ## Routes
//!
//! - `DirectAnswer` — Model text is the answer
//! - `ToolInvocation` — Dispatch a tool, then answer from its result
//! - `RetrievalAugmented` — Retrieve passages, then answer from them

// Re-export config types
pub use mentor_config::{
    ConfigError, GraphSettings, LlmSettings, MentorConfig, RetrievalSettings, ServerSettings,
    ToolSettings, TraceSettings,
};

// Re-export core types
pub use mentor_core::{
    AgentError, ConversationState, Message, MessageRole, ToolCallRequest, ToolFailure, ToolResult,
    ToolSchema,
};

// Re-export engine
pub use mentor_engine::{
    task, AnswerMode, Assistant, ExecutionTrace, GraphBuilder, IntentRouter, Node, NodeKind,
    RetrievalTrigger, RouteDecision, Session, Topic, TopicAnswer, TopicRouter, TurnOptions,
    TurnReport, WorkflowGraph, END, START, UNRESOLVED_ANSWER,
};

// Re-export generation
pub use mentor_llm::{
    CannedGenerator, Generation, GenerationClient, GenerationMode, GenerationOutcome, Generator,
    LlmClient, ScriptedGenerator,
};

// Re-export retrieval
pub use mentor_retrieval::{demo_corpus, tokenize, Bm25Index, Bm25Params, Document, ScoredDocument};

// Re-export tools
pub use mentor_tools::{
    validate_arguments, ParamSpec, ParamType, Tool, ToolDispatcher, ToolError, ToolRegistry,
};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use mentor::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::{AgentError, Message, MessageRole, ToolCallRequest, ToolResult};

    // Config
    pub use crate::MentorConfig;

    // Engine
    pub use crate::{AnswerMode, Assistant, RouteDecision, Session, TopicRouter, TurnOptions, TurnReport};

    // Generation
    pub use crate::{GenerationClient, GenerationOutcome, Generator};

    // Retrieval
    pub use crate::{Bm25Index, Bm25Params, Document};

    // Tools
    pub use crate::{ParamSpec, Tool, ToolError, ToolRegistry, ToolSchema};
}
