//! Generation façade: primary strategy, offline fallback, timeout and tracing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mentor_config::{LlmSettings, TraceSettings};
use mentor_core::{AgentError, Message, MessageRole, ToolSchema};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::client::LlmClient;
use crate::offline::CannedGenerator;
use crate::trace::{trace_sink_from_settings, NoopTraceSink, TraceRecord, TraceSink};
use crate::{GenerationOutcome, Generator};

/// Answer returned when even the fallback strategy fails.
pub const UNAVAILABLE_ANSWER: &str = "模型服务暂不可用，请稍后再试。";

/// Which strategy produced a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// The remote model answered.
    Online,
    /// A local substitute answered.
    Offline,
}

/// Result of [`GenerationClient::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub outcome: GenerationOutcome,
    pub mode: GenerationMode,
}

/// Uniform generation entry point.
///
/// The strategy is chosen once at construction: a remote primary when
/// credentials exist and offline mode is off, otherwise only the fallback.
/// [`generate`](Self::generate) never returns an error; transport, auth and
/// timeout failures are answered by the fallback and flagged as
/// [`GenerationMode::Offline`].
pub struct GenerationClient {
    primary: Option<Arc<dyn Generator>>,
    fallback: Arc<dyn Generator>,
    timeout: Duration,
    tracer: Arc<dyn TraceSink>,
}

impl GenerationClient {
    /// Creates a client with an optional primary and a mandatory fallback.
    pub fn new(primary: Option<Arc<dyn Generator>>, fallback: Arc<dyn Generator>) -> Self {
        Self {
            primary,
            fallback,
            timeout: Duration::from_secs(LlmSettings::default().timeout_secs),
            tracer: Arc::new(NoopTraceSink),
        }
    }

    /// Creates a client that only ever uses the given local strategy.
    pub fn offline(fallback: Arc<dyn Generator>) -> Self {
        Self::new(None, fallback)
    }

    /// Creates a client with a primary and the default canned fallback.
    pub fn online(primary: Arc<dyn Generator>) -> Self {
        Self::new(Some(primary), Arc::new(CannedGenerator::default()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn TraceSink>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Selects the strategy from settings.
    ///
    /// A missing API key is a configuration problem, not a crash: it is
    /// logged and the client runs offline.
    pub fn from_settings(llm: &LlmSettings, trace: &TraceSettings) -> Self {
        let fallback: Arc<dyn Generator> = Arc::new(CannedGenerator::new(llm.canned_responses.clone()));

        let primary: Option<Arc<dyn Generator>> = match (llm.offline, LlmClient::from_settings(llm)) {
            (true, _) => {
                info!("Offline mode requested, using canned responses");
                None
            }
            (false, Ok(client)) => {
                info!("Using remote model {} at {}", client.model(), llm.api_base);
                Some(Arc::new(client))
            }
            (false, Err(e)) => {
                warn!("{}; falling back to offline mode", e);
                None
            }
        };

        Self::new(primary, fallback)
            .with_timeout(Duration::from_secs(llm.timeout_secs))
            .with_tracer(trace_sink_from_settings(trace))
    }

    /// Returns `true` when no remote strategy is configured.
    pub fn is_offline(&self) -> bool {
        self.primary.is_none()
    }

    /// Produces a generation; never fails.
    pub async fn generate(&self, messages: &[Message], tools: &[ToolSchema]) -> Generation {
        let start = Instant::now();
        let generation = self.generate_inner(messages, tools).await;
        self.trace(messages, &generation, start.elapsed());
        generation
    }

    async fn generate_inner(&self, messages: &[Message], tools: &[ToolSchema]) -> Generation {
        if let Some(primary) = &self.primary {
            match self.call_primary(primary.as_ref(), messages, tools).await {
                Ok(outcome) => {
                    return Generation { outcome, mode: GenerationMode::Online };
                }
                Err(e) => warn!("Generator '{}' failed, using fallback: {}", primary.name(), e),
            }
        }

        match self.fallback.generate(messages, tools).await {
            Ok(outcome) => Generation { outcome, mode: GenerationMode::Offline },
            Err(e) => {
                warn!("Fallback generator '{}' failed: {}", self.fallback.name(), e);
                Generation {
                    outcome: GenerationOutcome::Text(UNAVAILABLE_ANSWER.to_string()),
                    mode: GenerationMode::Offline,
                }
            }
        }
    }

    async fn call_primary(
        &self,
        primary: &dyn Generator,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<GenerationOutcome, AgentError> {
        tokio::time::timeout(self.timeout, primary.generate(messages, tools))
            .await
            .map_err(|_| AgentError::Network(format!("timed out after {:?}", self.timeout)))?
    }

    fn trace(&self, messages: &[Message], generation: &Generation, elapsed: Duration) {
        let input = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let output = match &generation.outcome {
            GenerationOutcome::Text(text) => json!({ "text": text }),
            GenerationOutcome::ToolCall(call) => json!({ "tool": call.name, "arguments": call.arguments }),
        };

        self.tracer.record(TraceRecord {
            name: "generate".to_string(),
            input: json!(input),
            output,
            latency_ms: elapsed.as_millis() as u64,
            metadata: json!({
                "mode": generation.mode,
                "messages": messages.len(),
            }),
        });
    }
}
