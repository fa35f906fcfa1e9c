//! HTTP server entry point and Axum router setup.
//!
//! Builds the assistant and topic router once from configuration, keeps
//! conversations in memory and serves them over JSON endpoints.

mod dto;
mod error;
mod handlers;
mod services;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use mentor_config::MentorConfig;
use mentor_engine::{Assistant, TopicRouter};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::services::sessions::SessionStore;

/// Shared server state accessible from all handlers.
pub struct ServerState {
    pub assistant: Assistant,
    pub topic_router: TopicRouter,
    pub sessions: SessionStore,
}

impl ServerState {
    pub fn new(assistant: Assistant, topic_router: TopicRouter, sessions: SessionStore) -> Self {
        Self {
            assistant,
            topic_router,
            sessions,
        }
    }

    /// Builds every component from configuration.
    pub fn from_config(config: &MentorConfig) -> Result<Self> {
        let assistant = Assistant::from_config(config).context("failed to build assistant")?;
        let topic_router = TopicRouter::new(Arc::clone(assistant.client()), config.graph.max_steps)
            .context("failed to build topic router")?;

        info!("Registered {} tools: {:?}", assistant.registry().len(), assistant.registry().tool_names());
        if assistant.is_offline() {
            info!("Running in offline mode");
        }

        Ok(Self::new(assistant, topic_router, SessionStore::from_settings(&config.server)))
    }
}

/// Reads `MENTOR_CONFIG` (a JSON file) if set, then overlays the environment.
fn load_config() -> Result<MentorConfig> {
    let config = match std::env::var("MENTOR_CONFIG") {
        Ok(path) => {
            let mut config = MentorConfig::from_file(&path)?;
            config.apply_env();
            config.validate()?;
            info!("Loaded configuration from {}", path);
            config
        }
        Err(_) => MentorConfig::from_env()?,
    };
    Ok(config)
}

/// Builds the application router.
pub fn app(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/sessions/{id}", delete(handlers::sessions::remove))
        .route("/graphs/topic-router/invoke", post(handlers::topics::invoke))
        .route("/tools", get(handlers::tools::list))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = load_config()?;
    let state = Arc::new(ServerState::from_config(&config)?);

    let addr = config.server.bind.as_str();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn offline_app() -> Router {
        let mut config = MentorConfig::default();
        config.llm.offline = true;
        app(Arc::new(ServerState::from_config(&config).unwrap()))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn index_lists_endpoints() {
        let (status, body) = call(&offline_app(), "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "offline");
        assert!(body["endpoints"].as_array().unwrap().iter().any(|e| e == "POST /chat"));
    }

    #[tokio::test]
    async fn tools_are_listed_in_order() {
        let (status, body) = call(&offline_app(), "GET", "/tools", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "get_learning_path");
    }

    #[tokio::test]
    async fn chat_keeps_session() {
        let app = offline_app();
        let (status, first) = call(&app, "POST", "/chat", Some(json!({ "message": "你好" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["mode"], "offline");
        let id = first["session_id"].as_str().unwrap().to_string();

        let (status, second) = call(
            &app,
            "POST",
            "/chat",
            Some(json!({ "session_id": id, "message": "什么是 RAG？", "rag": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["session_id"], first["session_id"]);
        assert_eq!(second["route"]["route"], "retrieval_augmented");
        assert!(!second["passages"].as_array().unwrap().is_empty());

        let (status, _) = call(&app, "DELETE", &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "DELETE", &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_rejects_blank_message_and_unknown_session() {
        let app = offline_app();
        let (status, body) = call(&app, "POST", "/chat", Some(json!({ "message": "   " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = call(&app, "POST", "/chat", Some(json!({ "session_id": "nope", "message": "hi" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn topic_router_answers_offline() {
        let (status, body) = call(
            &offline_app(),
            "POST",
            "/graphs/topic-router/invoke",
            Some(json!({ "question": "LangChain 的 memory 怎么用" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topic"], "memory");
        assert_eq!(body["mode"], "offline");
    }
}
