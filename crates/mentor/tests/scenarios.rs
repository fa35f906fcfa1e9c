//! End-to-end turns through the assistant graph with local generators.

use std::sync::Arc;

use async_trait::async_trait;
use mentor::prelude::*;
use mentor::{demo_corpus, CannedGenerator, ScriptedGenerator, ToolFailure, UNRESOLVED_ANSWER};
use serde_json::{json, Value};

struct StartTimer;

#[async_trait]
impl Tool for StartTimer {
    fn name(&self) -> &str {
        "start_timer"
    }

    fn description(&self) -> &str {
        "Starts a study countdown"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::integer("duration").describe("Seconds").min(0.0)]
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        Ok(json!(format!("timer set for {}s", args["duration"])))
    }
}

fn build(client: GenerationClient, registry: ToolRegistry, corpus: Vec<Document>) -> Assistant {
    let config = MentorConfig::default();
    let index = Bm25Index::build(corpus, Bm25Params::default()).unwrap();
    Assistant::new(Arc::new(client), Arc::new(registry), Arc::new(index), &config).unwrap()
}

fn default_registry() -> ToolRegistry {
    ToolRegistry::with_defaults(&MentorConfig::default().tools).unwrap()
}

fn scripted(outcomes: Vec<GenerationOutcome>) -> GenerationClient {
    GenerationClient::offline(Arc::new(ScriptedGenerator::new(outcomes)))
}

#[tokio::test]
async fn system_info_turn_reports_host_and_date() {
    let call = ToolCallRequest::new("system_info", json!({}));
    let assistant = build(
        scripted(vec![GenerationOutcome::ToolCall(call)]),
        default_registry(),
        demo_corpus(),
    );

    let report = assistant
        .session()
        .send("帮我查看电脑 CPU、内存和今天的日期", TurnOptions::default())
        .await;

    match &report.route {
        Some(RouteDecision::ToolInvocation(call)) => assert_eq!(call.name, "system_info"),
        other => panic!("expected tool route, got {:?}", other),
    }

    let result = report.tool_result.as_ref().unwrap();
    assert!(result.is_success());
    let payload = result.payload().as_str().unwrap();
    assert!(payload.contains("CPU:"));
    assert!(payload.contains("内存总量:"));
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert!(payload.contains(&today));

    assert!(report.answer.contains(payload));
}

#[tokio::test]
async fn offline_retrieval_over_small_corpus() {
    let corpus = vec![
        Document::new("m1", "Memory 模块入门", "Memory 模块负责在多轮对话中保存上下文。"),
        Document::new("m2", "Memory 模块类型", "ConversationBufferMemory 会完整保留历史消息。"),
        Document::new("m3", "Memory 模块实践", "长对话可以用摘要记忆控制 token 数量。"),
    ];
    let client = GenerationClient::offline(Arc::new(CannedGenerator::default()));
    let assistant = build(client, default_registry(), corpus);

    let report = assistant
        .session()
        .send("LangChain 的 tool 模块应该怎么学？", TurnOptions::default())
        .await;

    assert_eq!(report.route, Some(RouteDecision::RetrievalAugmented));
    assert!(!report.passages.is_empty());
    assert_eq!(report.mode, AnswerMode::Offline);
    assert!(report.answer.contains("LangChain 的 tool 模块应该怎么学？"));
    assert_eq!(report.trace.visited, vec!["router", "retrieve", "respond"]);
}

#[tokio::test]
async fn out_of_range_argument_keeps_session_going() {
    let mut registry = ToolRegistry::new();
    registry.register(StartTimer).unwrap();

    let call = ToolCallRequest::new("start_timer", json!({ "duration": -5 }));
    let assistant = build(
        scripted(vec![
            GenerationOutcome::ToolCall(call),
            GenerationOutcome::Text("好的，换个时长吧。".into()),
        ]),
        registry,
        demo_corpus(),
    );

    let mut session = assistant.session();
    let report = session.send("开始一个 -5 秒的计时", TurnOptions::default()).await;

    let result = report.tool_result.as_ref().unwrap();
    assert!(!result.is_success());
    assert_eq!(result.failure_kind(), Some(ToolFailure::InvalidArguments));
    assert!(result.error().unwrap().contains("duration"));
    assert_eq!(report.mode, AnswerMode::Offline);
    assert!(report.answer.contains("start_timer 调用失败"));

    let next = session.send("那就算了", TurnOptions::default()).await;
    assert_eq!(next.answer, "好的，换个时长吧。");
    assert_eq!(session.history().len(), 4);
}

#[tokio::test]
async fn unknown_tool_is_reported_not_raised() {
    let call = ToolCallRequest::new("teleport", json!({}));
    let assistant = build(scripted(vec![GenerationOutcome::ToolCall(call)]), default_registry(), demo_corpus());

    let report = assistant.session().send("带我去月球", TurnOptions::default()).await;
    let result = report.tool_result.unwrap();
    assert_eq!(result.failure_kind(), Some(ToolFailure::NotFound));
    assert_ne!(report.answer, UNRESOLVED_ANSWER);
}

#[tokio::test]
async fn every_route_terminates_offline() {
    let client = GenerationClient::offline(Arc::new(CannedGenerator::default()));
    let assistant = build(client, default_registry(), demo_corpus());
    let mut session = assistant.session();

    let direct = session.send("你好", TurnOptions::default()).await;
    let rag = session.send("什么是 BM25？", TurnOptions::default()).await;
    let forced = session.send("随便聊聊", TurnOptions { force_retrieval: true }).await;

    for report in [&direct, &rag, &forced] {
        assert_eq!(report.mode, AnswerMode::Offline);
        assert!(!report.answer.is_empty());
        assert_eq!(report.trace.visited.last().map(String::as_str), Some("respond"));
    }
    assert!(matches!(direct.route, Some(RouteDecision::DirectAnswer(_))));
    assert_eq!(forced.route, Some(RouteDecision::RetrievalAugmented));
    assert_eq!(session.history().len(), 6);
}

#[tokio::test]
async fn scripted_run_out_falls_back_per_call() {
    let primary = Arc::new(ScriptedGenerator::new(vec![GenerationOutcome::Text("远程回答".into())]));
    let client = GenerationClient::online(primary);
    let assistant = build(client, default_registry(), demo_corpus());
    let mut session = assistant.session();

    let first = session.send("你好", TurnOptions::default()).await;
    assert_eq!(first.answer, "远程回答");
    assert_eq!(first.mode, AnswerMode::Online);

    let second = session.send("再说一次", TurnOptions::default()).await;
    assert_eq!(second.mode, AnswerMode::Offline);
}

#[test]
fn retrieval_query_properties() {
    let index = Bm25Index::build(demo_corpus(), Bm25Params::default()).unwrap();

    assert!(index.query("", 3).is_empty());
    assert!(index.query("memory", 0).is_empty());

    let hits = index.query("memory 对话", 3);
    assert_eq!(hits.len(), 3);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(index.query("memory 对话", 3), hits);

    let all = index.query("memory", 100);
    assert_eq!(all.len(), index.len());
}
