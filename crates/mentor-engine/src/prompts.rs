//! Prompt texts and offline answer templates.

use mentor_core::ToolResult;
use mentor_retrieval::ScoredDocument;

use crate::topics::Topic;

pub const ROUTER_SYSTEM: &str = "你是 LangChain 助教。若用户的问题需要借助工具（学习路线、本机系统信息、摄像头、命令行），\
请调用最合适的一个工具；否则直接用中文简洁作答。";

pub const TOOL_ANSWER_SYSTEM: &str = "你是 LangChain 助教，根据提供的工具输出，为用户生成自然语言回复。\
请用中文整理成友好且结构化的回答，若涉及摄像头操作需提醒用户注意隐私。";

pub const RAG_SYSTEM: &str = "你是严谨的知识库问答助手。仅依据给定上下文回答问题，\
若上下文不足以作答，请坦诚说明并提出下一步检索建议。";

pub const UNRESOLVED_ANSWER: &str = "抱歉，这个问题暂时无法处理，请换个问法再试。";

/// Numbers passages as `[n] title\ntext`, separated by blank lines.
pub fn format_passages(passages: &[ScoredDocument]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[{}] {}\n{}", i + 1, p.document.title, p.document.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn rag_user_prompt(question: &str, passages: &[ScoredDocument]) -> String {
    format!(
        "问题: {}\n\n可用上下文(按相关度排序):\n{}\n\n请给出中文回答，并在末尾列出使用到的条目编号。",
        question,
        format_passages(passages)
    )
}

/// Answer assembled from retrieved passages when no model is reachable.
pub fn offline_rag_answer(question: &str, passages: &[ScoredDocument]) -> String {
    let mut parts = vec!["模型服务不可用，已切换到离线 RAG 模式。".to_string()];

    let question = question.trim();
    if !question.is_empty() {
        parts.push(format!("\n== 问题 ==\n{}", question));
    }
    if passages.is_empty() {
        parts.push("\n未检索到相关资料，换个说法再试试？".to_string());
    } else {
        parts.push(format!("\n== 检索到的资料 ==\n{}", format_passages(passages)));
    }
    parts.push("\n回答建议：基于以上资料自行组织答案，并在末尾给出引用条目编号。".to_string());

    parts.join("\n")
}

/// Answer quoting a tool outcome when no model is reachable.
pub fn offline_tool_answer(result: &ToolResult) -> String {
    if result.is_success() {
        format!("工具 {} 的执行结果：\n{}", result.tool_name(), result.to_context())
    } else {
        format!(
            "工具 {} 调用失败：{}\n请检查参数后重试。",
            result.tool_name(),
            result.error().unwrap_or("未知错误")
        )
    }
}

pub fn topic_system_prompt(topic: Topic) -> &'static str {
    match topic {
        Topic::Prompt => "你是 LangChain Prompt 教练，请为学习者列出 3 步 Prompt 学习计划。",
        Topic::Memory => "你是 LangChain 记忆模块导师，请解释 memory 的用途并给出实践建议。",
        Topic::Tools => "你是 LangChain 工具与 Agent 导师，请说明如何入门 tool/agent 功能。",
        Topic::System => "你是系统信息助手，请提醒用户如何安全地检查本机配置并保护隐私。",
        Topic::General => "你是 LangChain 学习顾问，请给出泛化的自学路线和资源推荐。",
    }
}

pub fn topic_user_prompt(topic: Topic, question: &str) -> String {
    let instruction = match topic {
        Topic::Prompt => "请结合需求，输出条理清晰的计划。",
        Topic::Memory => "请用要点回答。",
        Topic::Tools => "请包含一个实际项目示例。",
        Topic::System => "请生成步骤提示。",
        Topic::General => "请以列表形式作答。",
    };
    format!("问题: {}\n{}", question, instruction)
}

pub fn topic_offline_answer(topic: Topic) -> &'static str {
    match topic {
        Topic::Prompt => "建议先阅读 LangChain Prompt 模块的官方指南，并尝试复现 few-shot 与输出控制示例，逐步积累可复用的提示语模板。",
        Topic::Memory => "可以从 ConversationBufferMemory 等基础记忆组件入手，理解它们如何在对话中维持上下文，再根据业务需求选择更高级的记忆策略。",
        Topic::Tools => "先实现一个调用搜索或计算工具的简单代理，熟悉工具描述、解析结果以及错误处理，再扩展到多工具协作的复杂场景。",
        Topic::System => "请在安全的前提下查询系统信息，例如使用内置命令行工具，并确保不要在公共环境中暴露敏感配置。",
        Topic::General => "建议从官方文档与开源示例入手，了解 LangChain 的核心概念，再选择一个小项目进行实践并加入社区讨论。",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::{ToolCallRequest, ToolFailure};
    use mentor_retrieval::Document;
    use serde_json::json;

    fn passage(title: &str, text: &str) -> ScoredDocument {
        ScoredDocument {
            document: Document::new(title, title, text),
            score: 1.0,
        }
    }

    #[test]
    fn passages_are_numbered() {
        let text = format_passages(&[passage("A", "alpha"), passage("B", "beta")]);
        assert_eq!(text, "[1] A\nalpha\n\n[2] B\nbeta");
    }

    #[test]
    fn offline_rag_mentions_question_and_sources() {
        let answer = offline_rag_answer("什么是 RAG？", &[passage("RAG 基础", "先检索再生成")]);
        assert!(answer.contains("== 问题 ==\n什么是 RAG？"));
        assert!(answer.contains("[1] RAG 基础"));

        let empty = offline_rag_answer("什么是 RAG？", &[]);
        assert!(empty.contains("未检索到相关资料"));
    }

    #[test]
    fn offline_tool_answer_explains_failure() {
        let call = ToolCallRequest::new("start_timer", json!({ "duration": -5 }));
        let result = ToolResult::failure(&call, ToolFailure::InvalidArguments, "'duration' must be >= 0");
        let answer = offline_tool_answer(&result);
        assert!(answer.contains("start_timer 调用失败"));
        assert!(answer.contains(">= 0"));
    }
}
