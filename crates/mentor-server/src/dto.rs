//! Request and response bodies.

use mentor_engine::TurnReport;
use serde::{Deserialize, Serialize};

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omit to start a new conversation.
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    /// Force retrieval for this turn.
    #[serde(default)]
    pub rag: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub report: TurnReport,
}

/// Request body for `POST /graphs/topic-router/invoke`.
#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub question: String,
}

/// Response for `GET /`.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mode: &'static str,
    pub endpoints: Vec<&'static str>,
}
