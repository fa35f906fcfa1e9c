//! Settings schema for mentor.
//!
//! Every component takes its settings as an explicit struct instead of
//! reading the process environment on its own:
//!
//! - [`MentorConfig`] — Top-level settings, one section per component
//! - [`LlmSettings`] — Generation endpoint, model, timeout, offline flag
//! - [`TraceSettings`] — Best-effort trace sink
//! - [`RetrievalSettings`] — BM25 constants, top-k and the retrieval trigger
//! - [`GraphSettings`] — Workflow step limit
//! - [`ToolSettings`] — Built-in tool switches
//! - [`ServerSettings`] — HTTP bind address and session limits
//!
//! # Loading
//!
//! ```rust
//! use mentor_config::MentorConfig;
//!
//! let config = MentorConfig::from_json(r#"{ "retrieval": { "top_k": 2 } }"#).unwrap();
//! assert_eq!(config.retrieval.top_k, 2);
//! assert_eq!(config.graph.max_steps, 10);
//! ```
//!
//! Environment variables are layered on top with [`MentorConfig::apply_env`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint (DashScope compatible mode).
pub const DEFAULT_API_BASE: &str = "https://dashscope-intl.aliyuncs.com/compatible-mode/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "qwen3-coder-plus";

/// Errors that can occur when loading or validating settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON configuration.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A setting has a value the components cannot work with.
    #[error("Invalid setting '{field}': {message}")]
    Validation { field: String, message: String },
}

impl ConfigError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }
}

/// Generation endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// API key for the endpoint. `None` forces the offline strategy.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL.
    pub api_base: String,
    /// Model identifier sent with every request.
    pub model: String,
    pub temperature: f32,
    /// Upper bound for a single remote call, in seconds.
    pub timeout_secs: u64,
    /// Skip the remote endpoint even when a key is present.
    pub offline: bool,
    /// Replaces the built-in offline answers when non-empty.
    pub canned_responses: Vec<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            timeout_secs: 30,
            offline: false,
            canned_responses: Vec::new(),
        }
    }
}

impl LlmSettings {
    /// Returns `true` when a remote call can be attempted at all.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Trace sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    pub enabled: bool,
    /// HTTP endpoint receiving trace records; log-only when absent.
    pub endpoint: Option<String>,
    /// Project label attached to every record.
    pub project: String,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            project: "mentor".to_string(),
        }
    }
}

/// Retrieval index and trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of passages spliced into a RAG prompt.
    pub top_k: usize,
    pub k1: f64,
    pub b: f64,
    /// Case-insensitive substrings that send a text answer down the RAG path.
    pub trigger_keywords: Vec<String>,
    /// Treat every text answer as a retrieval request.
    pub always: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            k1: 1.5,
            b: 0.75,
            trigger_keywords: ["rag", "bm25", "langchain", "检索", "知识库", "模块"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            always: false,
        }
    }
}

/// Workflow graph settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub max_steps: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self { max_steps: 10 }
    }
}

/// Built-in tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Actually run `run_shell` commands instead of a dry run.
    pub allow_shell: bool,
    pub shell_timeout_secs: u64,
    /// Register the camera launcher.
    pub enable_camera: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            allow_shell: false,
            shell_timeout_secs: 60,
            enable_camera: true,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    /// Sessions untouched for this long are dropped.
    pub session_idle_secs: u64,
    /// Upper bound on live sessions; the least recently used goes first.
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            session_idle_secs: 30 * 60,
            max_sessions: 1024,
        }
    }
}

/// Complete settings for one mentor process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MentorConfig {
    pub llm: LlmSettings,
    pub tracing: TraceSettings,
    pub retrieval: RetrievalSettings,
    pub graph: GraphSettings,
    pub tools: ToolSettings,
    pub server: ServerSettings,
}

const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];

fn is_truthy(value: &str) -> bool {
    TRUTHY.contains(&value.trim().to_ascii_lowercase().as_str())
}

impl MentorConfig {
    /// Loads settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Parses settings from a JSON string. Missing sections use defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlays settings from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlays settings using the given variable lookup.
    ///
    /// | Variable | Setting |
    /// |----------|---------|
    /// | `DASHSCOPE_API_KEY` | `llm.api_key` |
    /// | `DASHSCOPE_API_BASE` | `llm.api_base` |
    /// | `MENTOR_MODEL` | `llm.model` |
    /// | `MENTOR_OFFLINE` | `llm.offline` |
    /// | `MENTOR_TRACE_ENDPOINT` | `tracing.endpoint` (and enables tracing) |
    /// | `ALLOW_SHELL` | `tools.allow_shell` |
    /// | `MENTOR_RETRIEVAL_KEYWORDS` | `retrieval.trigger_keywords` (comma separated) |
    /// | `MENTOR_BIND` | `server.bind` |
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("DASHSCOPE_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(base) = lookup("DASHSCOPE_API_BASE") {
            self.llm.api_base = base;
        }
        if let Some(model) = lookup("MENTOR_MODEL") {
            self.llm.model = model;
        }
        if let Some(flag) = lookup("MENTOR_OFFLINE") {
            self.llm.offline = is_truthy(&flag);
        }
        if let Some(endpoint) = lookup("MENTOR_TRACE_ENDPOINT") {
            self.tracing.enabled = true;
            self.tracing.endpoint = Some(endpoint);
        }
        if let Some(flag) = lookup("ALLOW_SHELL") {
            self.tools.allow_shell = is_truthy(&flag);
        }
        if let Some(keywords) = lookup("MENTOR_RETRIEVAL_KEYWORDS") {
            self.retrieval.trigger_keywords = keywords
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(bind) = lookup("MENTOR_BIND") {
            self.server.bind = bind;
        }
    }

    /// Rejects values the components cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::validation("retrieval.top_k", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.retrieval.b) {
            return Err(ConfigError::validation("retrieval.b", "must be within [0, 1]"));
        }
        if self.retrieval.k1.is_nan() || self.retrieval.k1 < 0.0 {
            return Err(ConfigError::validation("retrieval.k1", "must be non-negative"));
        }
        if self.graph.max_steps == 0 {
            return Err(ConfigError::validation("graph.max_steps", "must be at least 1"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::validation("llm.timeout_secs", "must be at least 1"));
        }
        if self.server.session_idle_secs == 0 {
            return Err(ConfigError::validation("server.session_idle_secs", "must be at least 1"));
        }
        if self.server.max_sessions == 0 {
            return Err(ConfigError::validation("server.max_sessions", "must be at least 1"));
        }
        Ok(())
    }

    /// Serializes these settings to a JSON string (the API key is never written).
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
