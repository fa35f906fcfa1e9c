//! The tutoring assistant: one conversation turn as a workflow graph.
//!
//! ```text
//! START → router ─┬─ ToolInvocation ────→ tool ─────┐
//!                 ├─ RetrievalAugmented → retrieve ─┤
//!                 └─ DirectAnswer ──────────────────┴→ respond → END
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use mentor_config::MentorConfig;
use mentor_core::{AgentError, ConversationState, Message, ToolResult};
use mentor_llm::{GenerationClient, GenerationMode, GenerationOutcome};
use mentor_retrieval::{demo_corpus, Bm25Index, Bm25Params, ScoredDocument};
use mentor_tools::{ToolDispatcher, ToolRegistry};
use serde::Serialize;
use tracing::{info, warn};

use crate::graph::{ExecutionTrace, GraphBuilder, Node, NodeKind, WorkflowGraph, END, START};
use crate::prompts::{
    offline_rag_answer, offline_tool_answer, rag_user_prompt, RAG_SYSTEM, TOOL_ANSWER_SYSTEM, UNRESOLVED_ANSWER,
};
use crate::router::{IntentRouter, RetrievalTrigger, RouteDecision, TurnOptions};

/// How the final answer of a turn was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Composed by the remote model.
    Online,
    /// Assembled locally because no model was reachable.
    Offline,
    /// The workflow could not settle on an answer.
    Unresolved,
}

impl From<GenerationMode> for AnswerMode {
    fn from(mode: GenerationMode) -> Self {
        match mode {
            GenerationMode::Online => AnswerMode::Online,
            GenerationMode::Offline => AnswerMode::Offline,
        }
    }
}

/// State threaded through the turn graph.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub message: String,
    pub history: ConversationState,
    pub options: TurnOptions,
    pub decision: Option<RouteDecision>,
    pub mode: GenerationMode,
    pub tool_result: Option<ToolResult>,
    pub passages: Vec<ScoredDocument>,
    pub answer: Option<String>,
}

impl TurnContext {
    pub fn new(message: impl Into<String>, history: ConversationState, options: TurnOptions) -> Self {
        Self {
            message: message.into(),
            history,
            options,
            decision: None,
            mode: GenerationMode::Offline,
            tool_result: None,
            passages: Vec::new(),
            answer: None,
        }
    }

    fn wants_tool(&self) -> bool {
        matches!(self.decision, Some(RouteDecision::ToolInvocation(_)))
    }

    fn wants_retrieval(&self) -> bool {
        matches!(self.decision, Some(RouteDecision::RetrievalAugmented))
    }
}

/// Everything one turn produced.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub answer: String,
    pub route: Option<RouteDecision>,
    pub mode: AnswerMode,
    pub tool_result: Option<ToolResult>,
    pub passages: Vec<ScoredDocument>,
    pub trace: ExecutionTrace,
}

struct RouterNode {
    router: IntentRouter,
}

#[async_trait]
impl Node<TurnContext> for RouterNode {
    async fn run(&self, ctx: &mut TurnContext) -> Result<(), AgentError> {
        let routed = self.router.route(&ctx.message, &ctx.history, &ctx.options).await;
        ctx.decision = Some(routed.decision);
        ctx.mode = routed.mode;
        Ok(())
    }
}

struct ToolNode {
    dispatcher: ToolDispatcher,
}

#[async_trait]
impl Node<TurnContext> for ToolNode {
    async fn run(&self, ctx: &mut TurnContext) -> Result<(), AgentError> {
        let Some(RouteDecision::ToolInvocation(call)) = &ctx.decision else {
            return Err(AgentError::InvalidRequest("tool node reached without a tool call".into()));
        };
        ctx.tool_result = Some(self.dispatcher.dispatch(call).await);
        Ok(())
    }
}

struct RetrieveNode {
    index: Arc<Bm25Index>,
    top_k: usize,
}

#[async_trait]
impl Node<TurnContext> for RetrieveNode {
    async fn run(&self, ctx: &mut TurnContext) -> Result<(), AgentError> {
        ctx.passages = self.index.query(&ctx.message, self.top_k);
        info!("║     Retrieved {} passages", ctx.passages.len());
        Ok(())
    }
}

struct RespondNode {
    client: Arc<GenerationClient>,
}

impl RespondNode {
    /// Asks the model for a text answer; `None` means fall back to a template.
    async fn compose(&self, messages: Vec<Message>) -> Option<String> {
        if self.client.is_offline() {
            return None;
        }
        let generation = self.client.generate(&messages, &[]).await;
        match (generation.mode, generation.outcome) {
            (GenerationMode::Online, GenerationOutcome::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn conversation(ctx: &TurnContext, system: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(ctx.history.len() + 4);
        messages.push(Message::system(system));
        messages.extend(ctx.history.turns().iter().cloned());
        messages
    }
}

#[async_trait]
impl Node<TurnContext> for RespondNode {
    async fn run(&self, ctx: &mut TurnContext) -> Result<(), AgentError> {
        let (answer, mode) = match (&ctx.decision, &ctx.tool_result) {
            (Some(RouteDecision::ToolInvocation(call)), Some(result)) => {
                let mut messages = Self::conversation(ctx, TOOL_ANSWER_SYSTEM);
                messages.push(Message::user(ctx.message.as_str()));
                messages.push(Message::assistant_tool_call(call.clone()));
                messages.push(Message::tool(call.id.as_str(), result.to_context()));

                match self.compose(messages).await {
                    Some(text) => (text, GenerationMode::Online),
                    None => (offline_tool_answer(result), GenerationMode::Offline),
                }
            }
            (Some(RouteDecision::RetrievalAugmented), _) => {
                let mut messages = Self::conversation(ctx, RAG_SYSTEM);
                messages.push(Message::user(rag_user_prompt(&ctx.message, &ctx.passages)));

                match self.compose(messages).await {
                    Some(text) => (text, GenerationMode::Online),
                    None => (offline_rag_answer(&ctx.message, &ctx.passages), GenerationMode::Offline),
                }
            }
            (Some(RouteDecision::DirectAnswer(text)), _) => (text.clone(), ctx.mode),
            _ => {
                return Err(AgentError::InvalidRequest("respond reached without a usable route".into()));
            }
        };

        ctx.answer = Some(answer);
        ctx.mode = mode;
        Ok(())
    }
}

/// Shared, read-only assistant: the turn graph plus its collaborators.
///
/// Cheap to clone; every [`Session`] holds one.
#[derive(Clone)]
pub struct Assistant {
    graph: Arc<WorkflowGraph<TurnContext>>,
    registry: Arc<ToolRegistry>,
    client: Arc<GenerationClient>,
}

impl Assistant {
    /// Wires the turn graph from already built collaborators.
    pub fn new(
        client: Arc<GenerationClient>,
        registry: Arc<ToolRegistry>,
        index: Arc<Bm25Index>,
        config: &MentorConfig,
    ) -> Result<Self, AgentError> {
        let router = IntentRouter::new(
            Arc::clone(&client),
            registry.schemas(),
            RetrievalTrigger::from(&config.retrieval),
        );

        let graph = GraphBuilder::new("assistant-turn")
            .node("router", NodeKind::Router, RouterNode { router })
            .node("tool", NodeKind::Tool, ToolNode { dispatcher: ToolDispatcher::new(Arc::clone(&registry)) })
            .node("retrieve", NodeKind::Retrieval, RetrieveNode { index, top_k: config.retrieval.top_k })
            .node("respond", NodeKind::Generation, RespondNode { client: Arc::clone(&client) })
            .edge(START, "router")
            .edge_if("router", "tool", TurnContext::wants_tool)
            .edge_if("router", "retrieve", TurnContext::wants_retrieval)
            .edge("router", "respond")
            .edge("tool", "respond")
            .edge("retrieve", "respond")
            .edge("respond", END)
            .max_steps(config.graph.max_steps)
            .build()?;

        let needed = graph.longest_path();
        if config.graph.max_steps < needed {
            return Err(AgentError::InvalidGraph {
                graph: graph.name().to_string(),
                message: format!(
                    "max_steps {} is shorter than the longest route ({} nodes)",
                    config.graph.max_steps, needed
                ),
            });
        }

        Ok(Self {
            graph: Arc::new(graph),
            registry,
            client,
        })
    }

    /// Builds every collaborator from configuration: generation client,
    /// default tools and the demo corpus index.
    pub fn from_config(config: &MentorConfig) -> Result<Self, AgentError> {
        let client = Arc::new(GenerationClient::from_settings(&config.llm, &config.tracing));
        let registry = ToolRegistry::with_defaults(&config.tools)
            .map_err(|e| AgentError::Configuration(e.to_string()))?;
        let index = Bm25Index::build(demo_corpus(), Bm25Params::from(&config.retrieval))
            .map_err(|e| AgentError::Configuration(e.to_string()))?;

        Self::new(client, Arc::new(registry), Arc::new(index), config)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn client(&self) -> &Arc<GenerationClient> {
        &self.client
    }

    pub fn is_offline(&self) -> bool {
        self.client.is_offline()
    }

    /// Opens a new conversation with empty history.
    pub fn session(&self) -> Session {
        Session {
            assistant: self.clone(),
            history: ConversationState::new(),
        }
    }
}

/// One conversation. Owns its history; shares nothing mutable.
pub struct Session {
    assistant: Assistant,
    history: ConversationState,
}

impl Session {
    pub fn history(&self) -> &ConversationState {
        &self.history
    }

    /// Runs one turn. Never fails: a workflow that cannot settle ends the
    /// turn with [`AnswerMode::Unresolved`].
    pub async fn send(&mut self, message: &str, options: TurnOptions) -> TurnReport {
        let mut ctx = TurnContext::new(message, self.history.clone(), options);
        let graph = &self.assistant.graph;

        let report = match graph.run(&mut ctx).await {
            Ok(trace) => TurnReport {
                answer: ctx.answer.unwrap_or_else(|| UNRESOLVED_ANSWER.to_string()),
                route: ctx.decision,
                mode: ctx.mode.into(),
                tool_result: ctx.tool_result,
                passages: ctx.passages,
                trace,
            },
            Err(e) => {
                if e.is_unresolved() {
                    warn!("Turn unresolved: {}", e);
                } else {
                    warn!("Turn failed: {}", e);
                }
                TurnReport {
                    answer: UNRESOLVED_ANSWER.to_string(),
                    route: ctx.decision,
                    mode: AnswerMode::Unresolved,
                    tool_result: ctx.tool_result,
                    passages: ctx.passages,
                    trace: ExecutionTrace {
                        graph: graph.name().to_string(),
                        visited: Vec::new(),
                    },
                }
            }
        };

        self.history.push(Message::user(message));
        self.history.push(Message::assistant(report.answer.as_str()));
        report
    }
}
