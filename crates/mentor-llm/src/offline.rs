//! Local generators that never touch the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mentor_core::{AgentError, Message, ToolSchema};

use crate::{GenerationOutcome, Generator};

/// Placeholder answers handed out in rotation when no model is reachable.
pub const DEFAULT_CANNED_RESPONSES: [&str; 6] = [
    "PromptTemplate 让你在链式应用中重复使用提示词。",
    "LLMChain 负责把 Prompt 与 LLM 组合成可执行的链。",
    "Memory 组件用于保存对话上下文，提升回答连贯性。",
    "1. 阅读官方文档\n2. 动手实现示例\n3. 通过项目实践巩固",
    "1. 学 Agent 思维流程\n2. 熟悉 Tool Schema\n3. 构建小型自动化助手",
    "1. 规划学习目标\n2. 制定时间表\n3. 定期回顾",
];

/// Deterministic offline strategy: a fixed list of answers, handed out in order
/// and wrapping around.
pub struct CannedGenerator {
    responses: Vec<String>,
    cursor: AtomicUsize,
}

impl Default for CannedGenerator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CannedGenerator {
    /// Creates a generator over the given answers; an empty list selects the defaults.
    pub fn new(responses: Vec<String>) -> Self {
        let responses = if responses.is_empty() {
            DEFAULT_CANNED_RESPONSES.iter().map(|s| s.to_string()).collect()
        } else {
            responses
        };
        Self { responses, cursor: AtomicUsize::new(0) }
    }

    /// Returns the answers this generator rotates through.
    pub fn responses(&self) -> &[String] {
        &self.responses
    }
}

#[async_trait]
impl Generator for CannedGenerator {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate(
        &self,
        messages: &[Message],
        _tools: &[ToolSchema],
    ) -> Result<GenerationOutcome, AgentError> {
        if messages.is_empty() {
            return Err(AgentError::InvalidRequest("at least one message is required".into()));
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        Ok(GenerationOutcome::Text(self.responses[index].clone()))
    }
}

/// Replays a scripted list of outcomes, one per call.
///
/// Once the script runs out every further call fails with a network error,
/// which makes it handy for exercising the fallback path too.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<GenerationOutcome>>,
    requests: Mutex<Vec<Vec<Message>>>,
    advertised: Mutex<Vec<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<GenerationOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            advertised: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose every call fails.
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    /// Message lists received so far, in call order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Tool names offered on each call, in call order and schema order.
    pub fn advertised_tools(&self) -> Vec<Vec<String>> {
        self.advertised.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Number of scripted outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<GenerationOutcome, AgentError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        if let Ok(mut advertised) = self.advertised.lock() {
            advertised.push(tools.iter().map(|t| t.name.clone()).collect());
        }
        self.script
            .lock()
            .map_err(|_| AgentError::LlmError("script lock poisoned".into()))?
            .pop_front()
            .ok_or_else(|| AgentError::Network("scripted generator exhausted".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::ToolCallRequest;
    use serde_json::json;

    #[tokio::test]
    async fn canned_rotates_and_wraps() {
        let generator = CannedGenerator::new(vec!["a".into(), "b".into()]);
        let msgs = [Message::user("hi")];
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(generator.generate(&msgs, &[]).await.unwrap());
        }
        assert_eq!(
            seen,
            vec![
                GenerationOutcome::Text("a".into()),
                GenerationOutcome::Text("b".into()),
                GenerationOutcome::Text("a".into()),
            ]
        );
    }

    #[tokio::test]
    async fn canned_uses_defaults_when_empty() {
        let generator = CannedGenerator::default();
        assert_eq!(generator.responses().len(), DEFAULT_CANNED_RESPONSES.len());
        let first = generator.generate(&[Message::user("hi")], &[]).await.unwrap();
        assert_eq!(first.as_text(), Some(DEFAULT_CANNED_RESPONSES[0]));
    }

    #[tokio::test]
    async fn scripted_replays_then_fails() {
        let call = ToolCallRequest::new("system_info", json!({}));
        let generator = ScriptedGenerator::new(vec![
            GenerationOutcome::ToolCall(call.clone()),
            GenerationOutcome::Text("done".into()),
        ]);
        let msgs = [Message::user("hi")];

        assert_eq!(generator.generate(&msgs, &[]).await.unwrap(), GenerationOutcome::ToolCall(call));
        assert_eq!(generator.remaining(), 1);
        assert_eq!(generator.generate(&msgs, &[]).await.unwrap().as_text(), Some("done"));
        assert!(matches!(generator.generate(&msgs, &[]).await, Err(AgentError::Network(_))));
        assert_eq!(generator.requests().len(), 3);
    }

    #[tokio::test]
    async fn scripted_records_offered_tools() {
        let generator = ScriptedGenerator::new(vec![GenerationOutcome::Text("ok".into())]);
        let tools = [
            ToolSchema { name: "a".into(), description: String::new(), parameters: json!({}) },
            ToolSchema { name: "b".into(), description: String::new(), parameters: json!({}) },
        ];
        generator.generate(&[Message::user("hi")], &tools).await.unwrap();
        let _ = generator.generate(&[Message::user("again")], &[]).await;

        assert_eq!(generator.advertised_tools(), vec![vec!["a".to_string(), "b".to_string()], vec![]]);
    }
}
