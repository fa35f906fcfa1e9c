//! Chat turn handler.

use std::sync::Arc;

use axum::{extract::State, Json};
use mentor_engine::TurnOptions;
use tracing::info;

use crate::dto::{ChatRequest, ChatResponse};
use crate::error::AppError;
use crate::ServerState;

/// Runs one turn, creating the session when no id is given.
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("message must not be empty".into()));
    }

    let (session_id, session) = match req.session_id {
        Some(id) => {
            let session = state
                .sessions
                .get(&id)
                .await
                .ok_or_else(|| AppError::NotFound(format!("session '{}' not found", id)))?;
            (id, session)
        }
        None => state.sessions.create(&state.assistant).await,
    };

    info!(
        "Chat request (session: {}): {}...",
        session_id,
        message.chars().take(50).collect::<String>()
    );

    let options = TurnOptions { force_retrieval: req.rag };
    let report = session.lock().await.send(message, options).await;

    Ok(Json(ChatResponse { session_id, report }))
}
