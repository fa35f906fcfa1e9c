use crate::Document;

const DEMO: &[(&str, &str)] = &[
    ("RAG 基础", "检索增强生成（RAG）通过先检索相关文档，再结合大模型生成答案，以提升事实性与可控性。"),
    ("检索实现", "在没有向量数据库时，可先用 BM25 等词法检索作为过渡方案，之后再替换为向量检索。"),
    ("提示语设计", "RAG Prompt 常包含：用户问题、检索到的上下文、引用规则与语言风格要求。"),
    ("引用策略", "回答时应尽量基于提供的上下文，并在结尾以条目形式给出引用来源标题。"),
    ("LangChain 组合", "典型链路: question -> retriever -> format context -> prompt -> llm -> parser。"),
    ("LangGraph 升级", "复杂场景可用 LangGraph 将检索、重写、重检索、生成等步骤编排为可观测图谱。"),
    ("记忆与检索", "对话式 RAG 可混合短期对话记忆与长期知识库检索，二者职责不同。"),
    ("工具调用", "遇到缺失数据或需要结构化查询时，可在 RAG 之外调用外部工具或数据库。"),
];

/// The built-in knowledge base about RAG with LangChain, ids `demo:1`..`demo:8`.
pub fn demo_corpus() -> Vec<Document> {
    DEMO.iter()
        .enumerate()
        .map(|(i, (title, text))| Document::new(format!("demo:{}", i + 1), *title, *text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential() {
        let corpus = demo_corpus();
        assert_eq!(corpus.len(), 8);
        assert_eq!(corpus[0].id, "demo:1");
        assert_eq!(corpus[7].title, "工具调用");
    }
}
