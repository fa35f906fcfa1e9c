//! Explicit state-machine executor for workflow graphs.
//!
//! A [`WorkflowGraph`] owns named nodes and ordered edges. Execution starts
//! at [`START`], follows the first outgoing edge whose predicate holds, runs
//! the target node against the shared state and repeats until an edge
//! reaches [`END`].
//!
//! ```rust,ignore
//! let graph = GraphBuilder::new("turn")
//!     .node("router", NodeKind::Router, RouterNode)
//!     .node("tool", NodeKind::Tool, ToolNode)
//!     .edge(START, "router")
//!     .edge_if("router", "tool", |s: &TurnContext| s.wants_tool())
//!     .edge("router", END)
//!     .edge("tool", END)
//!     .build()?;
//!
//! let trace = graph.run(&mut state).await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use mentor_core::AgentError;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Virtual entry node.
pub const START: &str = "__start__";
/// Virtual exit node.
pub const END: &str = "__end__";

/// Default bound on node executions per run.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Role a node plays in a graph; used for logging and introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    Router,
    Tool,
    Retrieval,
    Generation,
    End,
    /// Any custom step.
    Task,
}

impl NodeKind {
    #[doc(hidden)]
    pub fn action_label(&self) -> &'static str {
        match self {
            NodeKind::Start => "Starting",
            NodeKind::Router => "Routing",
            NodeKind::Tool => "Executing tool",
            NodeKind::Retrieval => "Retrieving",
            NodeKind::Generation => "Generating",
            NodeKind::End => "Finishing",
            NodeKind::Task => "Running task",
        }
    }
}

/// A unit of work that mutates the graph state.
#[async_trait]
pub trait Node<S>: Send + Sync {
    async fn run(&self, state: &mut S) -> Result<(), AgentError>;
}

/// Adapts a synchronous closure into a [`Node`].
pub struct FnNode<F>(F);

/// Wraps a closure as a node.
pub fn task<S, F>(f: F) -> FnNode<F>
where
    S: Send,
    F: Fn(&mut S) -> Result<(), AgentError> + Send + Sync,
{
    FnNode(f)
}

#[async_trait]
impl<S, F> Node<S> for FnNode<F>
where
    S: Send,
    F: Fn(&mut S) -> Result<(), AgentError> + Send + Sync,
{
    async fn run(&self, state: &mut S) -> Result<(), AgentError> {
        (self.0)(state)
    }
}

type Predicate<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

struct Edge<S> {
    from: String,
    to: String,
    predicate: Option<Predicate<S>>,
    loop_back: bool,
}

impl<S> Edge<S> {
    fn matches(&self, state: &S) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(state))
    }
}

struct GraphNode<S> {
    name: String,
    kind: NodeKind,
    node: Arc<dyn Node<S>>,
}

/// Nodes visited during one run, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionTrace {
    pub graph: String,
    pub visited: Vec<String>,
}

impl ExecutionTrace {
    pub fn steps(&self) -> usize {
        self.visited.len()
    }

    pub fn visited(&self, node: &str) -> bool {
        self.visited.iter().any(|n| n == node)
    }
}

/// A validated, immutable workflow graph.
pub struct WorkflowGraph<S> {
    name: String,
    nodes: Vec<GraphNode<S>>,
    index: HashMap<String, usize>,
    edges: Vec<Edge<S>>,
    max_steps: usize,
}

impl<S> fmt::Debug for WorkflowGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowGraph")
            .field("name", &self.name)
            .field("nodes", &self.node_names())
            .field("edges", &self.edges.len())
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

impl<S> WorkflowGraph<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Node names in insertion order.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    pub fn node_kind(&self, name: &str) -> Option<NodeKind> {
        self.index.get(name).map(|&i| self.nodes[i].kind)
    }

    /// Nodes on the longest `START → END` route that repeats no node and
    /// takes no loop-back edge. A step limit below this can cut off a
    /// legitimate run.
    pub fn longest_path(&self) -> usize {
        let mut path = Vec::new();
        self.longest_from(START, &mut path).unwrap_or(0)
    }

    fn longest_from<'a>(&'a self, from: &str, path: &mut Vec<&'a str>) -> Option<usize> {
        let mut best = None;
        for edge in self.edges.iter().filter(|e| e.from == from && !e.loop_back) {
            let len = if edge.to == END {
                Some(0)
            } else if path.contains(&edge.to.as_str()) {
                None
            } else {
                path.push(edge.to.as_str());
                let rest = self.longest_from(&edge.to, path);
                path.pop();
                rest.map(|n| n + 1)
            };
            best = best.max(len);
        }
        best
    }
}

impl<S: Send> WorkflowGraph<S> {
    /// Runs the graph to completion against `state`.
    ///
    /// # Errors
    /// - [`AgentError::NoRoute`] when no outgoing edge matches
    /// - [`AgentError::UnexpectedCycle`] when a node is re-entered through
    ///   an edge that is not marked loop-back
    /// - [`AgentError::StepLimitExceeded`] when more than `max_steps` nodes run
    /// - [`AgentError::NodeFailed`] when a node returns an error
    pub async fn run(&self, state: &mut S) -> Result<ExecutionTrace, AgentError> {
        info!("╔══════════════════════════════════════════════════════════════");
        info!("║ GRAPH: {}", self.name);
        info!("╠══════════════════════════════════════════════════════════════");

        let mut trace = ExecutionTrace {
            graph: self.name.clone(),
            visited: Vec::new(),
        };
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current: &str = START;

        loop {
            let edge = self.next_edge(current, state).ok_or_else(|| {
                warn!("║ ⚠ No matching edge out of '{}'", current);
                AgentError::NoRoute {
                    graph: self.name.clone(),
                    node: current.to_string(),
                }
            })?;

            if edge.to == END {
                break;
            }

            if seen.contains(edge.to.as_str()) && !edge.loop_back {
                warn!("║ ⚠ Unexpected cycle {} → {}", current, edge.to);
                return Err(AgentError::UnexpectedCycle {
                    graph: self.name.clone(),
                    from: current.to_string(),
                    to: edge.to.clone(),
                });
            }

            if trace.steps() >= self.max_steps {
                warn!("║ ⚠ Step limit ({}) reached", self.max_steps);
                return Err(AgentError::StepLimitExceeded {
                    graph: self.name.clone(),
                    max_steps: self.max_steps,
                });
            }

            let node = &self.nodes[self.index[&edge.to]];
            self.run_node(node, trace.steps() + 1, state).await?;

            seen.insert(node.name.as_str());
            trace.visited.push(node.name.clone());
            current = node.name.as_str();
        }

        info!("║ Graph complete: {}", trace.visited.join(" → "));
        info!("╚══════════════════════════════════════════════════════════════");
        Ok(trace)
    }

    async fn run_node(&self, node: &GraphNode<S>, step: usize, state: &mut S) -> Result<(), AgentError> {
        info!("╠──────────────────────────────────────────────────────────────");
        info!("║ [{}] NODE: {} ({:?})", step, node.name, node.kind);
        info!("║     → {}", node.kind.action_label());

        let start = Instant::now();
        match node.node.run(state).await {
            Ok(()) => {
                info!("║     ✓ Completed in {:?}", start.elapsed());
                Ok(())
            }
            Err(e) if e.is_unresolved() => Err(e),
            Err(e) => {
                warn!("║     ✗ Failed: {}", e);
                Err(AgentError::NodeFailed {
                    node: node.name.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    fn next_edge(&self, from: &str, state: &S) -> Option<&Edge<S>> {
        let edge = self.edges.iter().filter(|e| e.from == from).find(|e| e.matches(state));
        if let Some(edge) = edge {
            debug!("║     {} → {}", from, edge.to);
        }
        edge
    }
}

/// Fluent builder for [`WorkflowGraph`].
///
/// Edges out of a node are evaluated in the order they were added.
pub struct GraphBuilder<S> {
    name: String,
    nodes: Vec<GraphNode<S>>,
    edges: Vec<Edge<S>>,
    max_steps: usize,
}

impl<S: Send + 'static> GraphBuilder<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Adds a named node.
    pub fn node(mut self, name: impl Into<String>, kind: NodeKind, node: impl Node<S> + 'static) -> Self {
        self.nodes.push(GraphNode {
            name: name.into(),
            kind,
            node: Arc::new(node),
        });
        self
    }

    /// Adds an unconditional edge.
    pub fn edge(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.push_edge(from, to, None, false)
    }

    /// Adds an edge taken only when `predicate` holds.
    pub fn edge_if<P>(self, from: impl Into<String>, to: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.push_edge(from, to, Some(Arc::new(predicate)), false)
    }

    /// Adds a conditional edge that may re-enter an already visited node.
    pub fn loop_back_if<P>(self, from: impl Into<String>, to: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.push_edge(from, to, Some(Arc::new(predicate)), true)
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    fn push_edge(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        predicate: Option<Predicate<S>>,
        loop_back: bool,
    ) -> Self {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            predicate,
            loop_back,
        });
        self
    }

    /// Validates and freezes the graph.
    pub fn build(self) -> Result<WorkflowGraph<S>, AgentError> {
        let invalid = |message: String| AgentError::InvalidGraph {
            graph: self.name.clone(),
            message,
        };

        if self.max_steps == 0 {
            return Err(invalid("max_steps must be at least 1".into()));
        }

        let mut index = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.name == START || node.name == END {
                return Err(invalid(format!("'{}' is a reserved node name", node.name)));
            }
            if index.insert(node.name.clone(), i).is_some() {
                return Err(invalid(format!("duplicate node '{}'", node.name)));
            }
        }

        for edge in &self.edges {
            if edge.from == END {
                return Err(invalid("edges cannot leave END".into()));
            }
            if edge.to == START {
                return Err(invalid("edges cannot enter START".into()));
            }
            for endpoint in [&edge.from, &edge.to] {
                if endpoint != START && endpoint != END && !index.contains_key(endpoint) {
                    return Err(invalid(format!("edge references unknown node '{}'", endpoint)));
                }
            }
        }

        if !self.edges.iter().any(|e| e.from == START) {
            return Err(invalid("no entry edge from START".into()));
        }
        if !self.edges.iter().any(|e| e.to == END) {
            return Err(invalid("no edge reaches END".into()));
        }

        Ok(WorkflowGraph {
            name: self.name,
            nodes: self.nodes,
            index,
            edges: self.edges,
            max_steps: self.max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        hits: usize,
        log: Vec<&'static str>,
    }

    fn bump(label: &'static str) -> FnNode<impl Fn(&mut Counter) -> Result<(), AgentError> + Send + Sync> {
        task(move |s: &mut Counter| {
            s.hits += 1;
            s.log.push(label);
            Ok(())
        })
    }

    #[tokio::test]
    async fn first_matching_edge_wins() {
        let graph = GraphBuilder::new("branch")
            .node("a", NodeKind::Task, bump("a"))
            .node("b", NodeKind::Task, bump("b"))
            .node("c", NodeKind::Task, bump("c"))
            .edge(START, "a")
            .edge_if("a", "b", |s: &Counter| s.hits > 5)
            .edge("a", "c")
            .edge("a", "b")
            .edge("b", END)
            .edge("c", END)
            .build()
            .unwrap();

        let mut state = Counter::default();
        let trace = graph.run(&mut state).await.unwrap();
        assert_eq!(trace.visited, vec!["a", "c"]);
        assert_eq!(state.log, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn loop_back_edges_are_bounded() {
        let graph = GraphBuilder::new("retry")
            .node("work", NodeKind::Task, bump("work"))
            .edge(START, "work")
            .loop_back_if("work", "work", |s: &Counter| s.hits < 3)
            .edge("work", END)
            .build()
            .unwrap();

        let mut state = Counter::default();
        let trace = graph.run(&mut state).await.unwrap();
        assert_eq!(trace.steps(), 3);

        let endless = GraphBuilder::new("endless")
            .node("work", NodeKind::Task, bump("work"))
            .edge(START, "work")
            .loop_back_if("work", "work", |_: &Counter| true)
            .edge("work", END)
            .max_steps(4)
            .build()
            .unwrap();

        let err = endless.run(&mut Counter::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::StepLimitExceeded { max_steps: 4, .. }));
        assert!(err.is_unresolved());
    }

    #[tokio::test]
    async fn plain_edge_cycle_is_rejected() {
        let graph = GraphBuilder::new("cycle")
            .node("a", NodeKind::Task, bump("a"))
            .node("b", NodeKind::Task, bump("b"))
            .edge(START, "a")
            .edge("a", "b")
            .edge("b", "a")
            .edge("b", END)
            .build()
            .unwrap();

        let err = graph.run(&mut Counter::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::UnexpectedCycle { ref from, ref to, .. } if from == "b" && to == "a"));
    }

    #[tokio::test]
    async fn missing_route_is_reported() {
        let graph = GraphBuilder::new("dead-end")
            .node("a", NodeKind::Task, bump("a"))
            .edge(START, "a")
            .edge_if("a", END, |s: &Counter| s.hits > 10)
            .build()
            .unwrap();

        let err = graph.run(&mut Counter::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::NoRoute { ref node, .. } if node == "a"));
    }

    #[tokio::test]
    async fn node_errors_name_the_node() {
        let graph = GraphBuilder::new("failing")
            .node("boom", NodeKind::Task, task(|_: &mut Counter| Err(AgentError::LlmError("bad".into()))))
            .edge(START, "boom")
            .edge("boom", END)
            .build()
            .unwrap();

        let err = graph.run(&mut Counter::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::NodeFailed { ref node, .. } if node == "boom"));
    }

    #[test]
    fn build_validates_structure() {
        let unknown = GraphBuilder::<Counter>::new("g")
            .edge(START, "ghost")
            .edge("ghost", END)
            .build();
        assert!(matches!(unknown, Err(AgentError::InvalidGraph { .. })));

        let no_entry = GraphBuilder::new("g")
            .node("a", NodeKind::Task, bump("a"))
            .edge("a", END)
            .build();
        assert!(no_entry.is_err());

        let no_exit = GraphBuilder::new("g")
            .node("a", NodeKind::Task, bump("a"))
            .edge(START, "a")
            .build();
        assert!(no_exit.is_err());

        let duplicate = GraphBuilder::new("g")
            .node("a", NodeKind::Task, bump("a"))
            .node("a", NodeKind::Task, bump("a"))
            .edge(START, "a")
            .edge("a", END)
            .build();
        assert!(duplicate.is_err());
    }

    #[test]
    fn node_kinds_are_recorded() {
        let graph = GraphBuilder::new("g")
            .node("router", NodeKind::Router, bump("r"))
            .edge(START, "router")
            .edge("router", END)
            .build()
            .unwrap();
        assert_eq!(graph.node_kind("router"), Some(NodeKind::Router));
        assert_eq!(graph.node_kind("missing"), None);
        assert_eq!(graph.node_names(), vec!["router"]);
    }

    #[test]
    fn longest_path_ignores_loop_backs_and_cycles() {
        let graph = GraphBuilder::new("g")
            .node("a", NodeKind::Task, bump("a"))
            .node("b", NodeKind::Task, bump("b"))
            .node("c", NodeKind::Task, bump("c"))
            .edge(START, "a")
            .edge_if("a", "b", |s: &Counter| s.hits > 1)
            .edge("a", "c")
            .edge("b", "c")
            .edge("b", "a")
            .loop_back_if("c", "c", |_: &Counter| false)
            .edge("c", END)
            .build()
            .unwrap();
        assert_eq!(graph.longest_path(), 3);

        let short = GraphBuilder::new("g")
            .node("a", NodeKind::Task, bump("a"))
            .edge(START, "a")
            .edge("a", END)
            .build()
            .unwrap();
        assert_eq!(short.longest_path(), 1);
    }
}
