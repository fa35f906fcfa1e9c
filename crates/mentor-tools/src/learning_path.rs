use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{ParamSpec, Tool, ToolError};

const DEFAULT_TOPIC: &str = "tools";

const GENERAL_ADVICE: &str =
    "推荐先掌握 LangChain 的 Prompt、Chain、Memory 和 Tool 四大模块，再根据项目需求深入。";

/// Suggests a study plan for one LangChain topic.
pub struct LearningPathTool;

impl LearningPathTool {
    /// Looks up the plan for `topic` (trimmed, case-insensitive).
    pub fn plan_for(topic: &str) -> &'static str {
        match topic.trim().to_lowercase().as_str() {
            "prompt" => "1. 学习 PromptTemplate 的变量替换\n2. 尝试 Few-shot Prompt\n3. 阅读 LangChain Prompt 管理章节",
            "memory" => "1. 回顾对话式 LLM 的上下文处理\n2. 了解 ConversationBufferMemory\n3. 实验其他 Memory 变体",
            "tools" => "1. 学习 Tool 与 AgentExecutor 的基本概念\n2. 实战 create_openai_functions_agent\n3. 组合检索、计算等外部能力",
            _ => GENERAL_ADVICE,
        }
    }
}

#[async_trait]
impl Tool for LearningPathTool {
    fn name(&self) -> &str {
        "get_learning_path"
    }

    fn description(&self) -> &str {
        "根据主题关键词（prompt / memory / tools）给出 LangChain 学习路线。"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::string("topic")
            .describe("学习主题关键词，例如 prompt、memory 或 tools")
            .optional()]
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let topic = args
            .get("topic")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TOPIC);
        Ok(json!(Self::plan_for(topic)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_topic_is_case_insensitive() {
        let out = LearningPathTool.execute(json!({ "topic": "  Memory " })).await.unwrap();
        assert!(out.as_str().unwrap().contains("ConversationBufferMemory"));
    }

    #[tokio::test]
    async fn missing_topic_defaults_to_tools() {
        let out = LearningPathTool.execute(json!({})).await.unwrap();
        assert!(out.as_str().unwrap().contains("AgentExecutor"));
    }

    #[test]
    fn unknown_topic_gets_general_advice() {
        assert_eq!(LearningPathTool::plan_for("cooking"), GENERAL_ADVICE);
    }
}
