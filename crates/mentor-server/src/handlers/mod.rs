//! HTTP route handlers for the mentor server.

pub mod chat;
pub mod sessions;
pub mod tools;
pub mod topics;

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::IndexResponse;
use crate::ServerState;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// Lists the available endpoints and the generation mode.
pub async fn index(State(state): State<Arc<ServerState>>) -> Json<IndexResponse> {
    Json(IndexResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        mode: if state.assistant.is_offline() { "offline" } else { "online" },
        endpoints: vec![
            "GET /health",
            "GET /tools",
            "POST /chat",
            "DELETE /sessions/{id}",
            "POST /graphs/topic-router/invoke",
        ],
    })
}
