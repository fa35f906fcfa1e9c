//! Routing and workflow execution for mentor.
//!
//! This crate turns a user message into an answer:
//!
//! - [`IntentRouter`] — Asks the model (with every tool advertised) how to answer
//! - [`WorkflowGraph`] / [`GraphBuilder`] — Explicit state-machine executor with bounded steps
//! - [`Assistant`] / [`Session`] — The per-turn graph `router → tool | retrieve → respond`
//! - [`TopicRouter`] — Keyword classifier graph with topic-specific answers
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mentor_config::MentorConfig;
//! use mentor_engine::{Assistant, TurnOptions};
//!
//! let config = MentorConfig::from_env()?;
//! let assistant = Assistant::from_config(&config)?;
//!
//! let mut session = assistant.session();
//! let report = session.send("帮我看看电脑配置", TurnOptions::default()).await;
//! println!("[{:?}] {}", report.mode, report.answer);
//! ```
//!
//! # Execution Model
//!
//! 1. **Route** — A tool call from the model always wins; otherwise a
//!    retrieval trigger (keyword or per-turn flag) selects RAG
//! 2. **Act** — Dispatch the tool, or query the BM25 index
//! 3. **Respond** — Compose online, or fall back to a local template
//!
//! A turn that exceeds the step limit or finds no route ends with an
//! explicit unresolved answer instead of an error.

mod assistant;
mod graph;
mod prompts;
mod router;
mod topics;

pub use assistant::{AnswerMode, Assistant, Session, TurnContext, TurnReport};
pub use graph::{
    task, ExecutionTrace, FnNode, GraphBuilder, Node, NodeKind, WorkflowGraph, DEFAULT_MAX_STEPS, END, START,
};
pub use prompts::UNRESOLVED_ANSWER;
pub use router::{IntentRouter, RetrievalTrigger, RouteDecision, Routed, TurnOptions};
pub use topics::{Topic, TopicAnswer, TopicRouter};
