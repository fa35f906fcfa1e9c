//! Keyword topic router: classify a question, then answer it with a
//! topic-specific prompt.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use mentor_core::{AgentError, Message};
use mentor_llm::{GenerationClient, GenerationMode, GenerationOutcome};
use serde::Serialize;
use tracing::{info, warn};

use crate::assistant::AnswerMode;
use crate::graph::{task, GraphBuilder, Node, NodeKind, WorkflowGraph, END, START};
use crate::prompts::{topic_offline_answer, topic_system_prompt, topic_user_prompt, UNRESOLVED_ANSWER};

/// Learning topic a question belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Prompt,
    Memory,
    Tools,
    System,
    #[default]
    General,
}

impl Topic {
    pub const ALL: [Topic; 5] = [Topic::Prompt, Topic::Memory, Topic::Tools, Topic::System, Topic::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Prompt => "prompt",
            Topic::Memory => "memory",
            Topic::Tools => "tools",
            Topic::System => "system",
            Topic::General => "general",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Topic::Prompt => &["prompt", "few-shot", "提示"],
            Topic::Memory => &["memory", "记忆", "conversation"],
            Topic::Tools => &["tool", "工具", "agent"],
            Topic::System => &["cpu", "内存", "硬盘", "日期", "系统"],
            Topic::General => &[],
        }
    }

    fn reasoning(&self) -> &'static str {
        match self {
            Topic::Prompt => "根据关键词判断为 Prompt 相关",
            Topic::Memory => "识别到 Memory 相关关键词",
            Topic::Tools => "检测到工具 / Agent 主题",
            Topic::System => "包含系统信息查询关键词",
            Topic::General => "未匹配特定主题，使用通用回答",
        }
    }

    fn node_name(&self) -> String {
        format!("answer_{}", self.as_str())
    }

    /// Picks the first topic whose keywords occur in the question.
    pub fn classify(question: &str) -> (Topic, &'static str) {
        let text = question.to_lowercase();
        let topic = Topic::ALL
            .into_iter()
            .find(|t| t.keywords().iter().any(|k| text.contains(k)))
            .unwrap_or(Topic::General);
        (topic, topic.reasoning())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one topic-router invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicAnswer {
    pub question: String,
    pub topic: Topic,
    pub reasoning: String,
    pub answer: String,
    pub mode: AnswerMode,
}

#[derive(Debug, Default)]
struct TopicState {
    question: String,
    topic: Topic,
    reasoning: String,
    answer: String,
    mode: Option<GenerationMode>,
}

struct TopicAnswerNode {
    topic: Topic,
    client: Arc<GenerationClient>,
}

#[async_trait]
impl Node<TopicState> for TopicAnswerNode {
    async fn run(&self, state: &mut TopicState) -> Result<(), AgentError> {
        if self.client.is_offline() {
            state.answer = topic_offline_answer(self.topic).to_string();
            state.mode = Some(GenerationMode::Offline);
            return Ok(());
        }

        let messages = [
            Message::system(topic_system_prompt(self.topic)),
            Message::user(topic_user_prompt(self.topic, &state.question)),
        ];
        let generation = self.client.generate(&messages, &[]).await;

        state.answer = match (&generation.mode, &generation.outcome) {
            (GenerationMode::Online, GenerationOutcome::Text(text)) => text.clone(),
            _ => topic_offline_answer(self.topic).to_string(),
        };
        state.mode = Some(match generation.outcome {
            GenerationOutcome::Text(_) => generation.mode,
            GenerationOutcome::ToolCall(_) => GenerationMode::Offline,
        });
        Ok(())
    }
}

/// Graph `classify → answer_<topic> → END`.
pub struct TopicRouter {
    graph: WorkflowGraph<TopicState>,
}

impl TopicRouter {
    pub fn new(client: Arc<GenerationClient>, max_steps: usize) -> Result<Self, AgentError> {
        let classify = task(|state: &mut TopicState| {
            let (topic, reasoning) = Topic::classify(&state.question);
            info!("║     Topic: {} ({})", topic, reasoning);
            state.topic = topic;
            state.reasoning = reasoning.to_string();
            Ok(())
        });

        let mut builder = GraphBuilder::new("topic-router")
            .node("classify", NodeKind::Router, classify)
            .edge(START, "classify")
            .max_steps(max_steps);

        for topic in Topic::ALL {
            builder = builder
                .node(
                    topic.node_name(),
                    NodeKind::Generation,
                    TopicAnswerNode { topic, client: Arc::clone(&client) },
                )
                .edge_if("classify", topic.node_name(), move |s: &TopicState| s.topic == topic)
                .edge(topic.node_name(), END);
        }

        Ok(Self { graph: builder.build()? })
    }

    pub async fn invoke(&self, question: &str) -> Result<TopicAnswer, AgentError> {
        let mut state = TopicState {
            question: question.trim().to_string(),
            ..TopicState::default()
        };
        let (answer, mode) = match self.graph.run(&mut state).await {
            Ok(_) => (state.answer, state.mode.unwrap_or(GenerationMode::Offline).into()),
            Err(e) if e.is_unresolved() => {
                warn!("Topic question unresolved: {}", e);
                (UNRESOLVED_ANSWER.to_string(), AnswerMode::Unresolved)
            }
            Err(e) => return Err(e),
        };

        Ok(TopicAnswer {
            question: state.question,
            topic: state.topic,
            reasoning: state.reasoning,
            answer,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_llm::{CannedGenerator, ScriptedGenerator};

    #[test]
    fn classification_follows_keyword_order() {
        assert_eq!(Topic::classify("怎么写 Few-Shot 提示").0, Topic::Prompt);
        assert_eq!(Topic::classify("ConversationBufferMemory 是什么").0, Topic::Memory);
        assert_eq!(Topic::classify("如何编写 agent").0, Topic::Tools);
        assert_eq!(Topic::classify("查看 CPU 型号").0, Topic::System);
        assert_eq!(Topic::classify("你好").0, Topic::General);
        // prompt is checked before tools
        assert_eq!(Topic::classify("tool prompt").0, Topic::Prompt);
    }

    #[tokio::test]
    async fn offline_uses_fixed_advice() {
        let client = Arc::new(GenerationClient::offline(Arc::new(CannedGenerator::default())));
        let router = TopicRouter::new(client, 10).unwrap();

        let answer = router.invoke("我想系统地学习 LangChain 的 prompt 写法").await.unwrap();
        assert_eq!(answer.topic, Topic::Prompt);
        assert_eq!(answer.reasoning, "根据关键词判断为 Prompt 相关");
        assert_eq!(answer.answer, topic_offline_answer(Topic::Prompt));
        assert_eq!(answer.mode, AnswerMode::Offline);
    }

    #[tokio::test]
    async fn online_uses_topic_prompt() {
        let scripted = Arc::new(ScriptedGenerator::new(vec![GenerationOutcome::Text("三步计划".into())]));
        let client = Arc::new(GenerationClient::online(scripted.clone()));
        let router = TopicRouter::new(client, 10).unwrap();

        let answer = router.invoke("memory 怎么用？").await.unwrap();
        assert_eq!(answer.topic, Topic::Memory);
        assert_eq!(answer.answer, "三步计划");
        assert_eq!(answer.mode, AnswerMode::Online);

        let request = &scripted.requests()[0];
        assert_eq!(request[0].content, topic_system_prompt(Topic::Memory));
    }

    #[tokio::test]
    async fn step_limit_gives_unresolved_answer() {
        let client = Arc::new(GenerationClient::offline(Arc::new(CannedGenerator::default())));
        let router = TopicRouter::new(client, 1).unwrap();

        let answer = router.invoke("memory 怎么用？").await.unwrap();
        assert_eq!(answer.topic, Topic::Memory);
        assert_eq!(answer.answer, UNRESOLVED_ANSWER);
        assert_eq!(answer.mode, AnswerMode::Unresolved);
    }
}
