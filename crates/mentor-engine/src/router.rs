//! Intent routing: decides how a user message will be answered.

use std::sync::Arc;

use mentor_config::RetrievalSettings;
use mentor_core::{ConversationState, Message, ToolCallRequest, ToolSchema};
use mentor_llm::{GenerationClient, GenerationMode, GenerationOutcome};
use serde::Serialize;
use tracing::info;

use crate::prompts::ROUTER_SYSTEM;

/// How a turn will be answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "route", content = "detail", rename_all = "snake_case")]
pub enum RouteDecision {
    /// The model answered directly; carries its text.
    DirectAnswer(String),
    /// The model asked for a tool.
    ToolInvocation(ToolCallRequest),
    /// Answer from retrieved passages.
    RetrievalAugmented,
}

impl RouteDecision {
    pub fn label(&self) -> &'static str {
        match self {
            RouteDecision::DirectAnswer(_) => "direct_answer",
            RouteDecision::ToolInvocation(_) => "tool_invocation",
            RouteDecision::RetrievalAugmented => "retrieval_augmented",
        }
    }
}

/// Per-turn flags supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TurnOptions {
    /// Use retrieval for this turn regardless of keywords.
    pub force_retrieval: bool,
}

/// Decides when a text reply should be replaced by a retrieval answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalTrigger {
    keywords: Vec<String>,
    always: bool,
}

impl RetrievalTrigger {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(|k| k.into().to_lowercase()).collect(),
            always: false,
        }
    }

    pub fn always() -> Self {
        Self { keywords: Vec::new(), always: true }
    }

    pub fn never() -> Self {
        Self::default()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Case-insensitive substring match against any keyword.
    pub fn matches(&self, message: &str) -> bool {
        if self.always {
            return true;
        }
        let text = message.to_lowercase();
        self.keywords.iter().any(|k| !k.is_empty() && text.contains(k.as_str()))
    }
}

impl From<&RetrievalSettings> for RetrievalTrigger {
    fn from(settings: &RetrievalSettings) -> Self {
        Self {
            always: settings.always,
            ..Self::new(settings.trigger_keywords.iter().cloned())
        }
    }
}

/// Router output: the decision and which strategy produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub decision: RouteDecision,
    pub mode: GenerationMode,
}

/// Classifies a user message into a [`RouteDecision`].
///
/// The model sees the whole conversation and every registered tool. A tool
/// call always wins; a text reply becomes retrieval when the trigger
/// matches or the caller forces it.
pub struct IntentRouter {
    client: Arc<GenerationClient>,
    tools: Vec<ToolSchema>,
    trigger: RetrievalTrigger,
}

impl IntentRouter {
    pub fn new(client: Arc<GenerationClient>, tools: Vec<ToolSchema>, trigger: RetrievalTrigger) -> Self {
        Self { client, tools, trigger }
    }

    pub fn trigger(&self) -> &RetrievalTrigger {
        &self.trigger
    }

    pub async fn route(&self, message: &str, history: &ConversationState, options: &TurnOptions) -> Routed {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(ROUTER_SYSTEM));
        messages.extend(history.turns().iter().cloned());
        messages.push(Message::user(message));

        let generation = self.client.generate(&messages, &self.tools).await;

        let decision = match generation.outcome {
            GenerationOutcome::ToolCall(call) => RouteDecision::ToolInvocation(call),
            GenerationOutcome::Text(_) if options.force_retrieval || self.trigger.matches(message) => {
                RouteDecision::RetrievalAugmented
            }
            GenerationOutcome::Text(text) => RouteDecision::DirectAnswer(text),
        };

        info!("║     Route: {} ({:?})", decision.label(), generation.mode);
        Routed { decision, mode: generation.mode }
    }
}
