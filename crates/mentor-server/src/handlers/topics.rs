use std::sync::Arc;

use axum::{extract::State, Json};
use mentor_engine::TopicAnswer;

use crate::dto::TopicRequest;
use crate::error::AppError;
use crate::ServerState;

/// Runs the topic-router graph for one question.
pub async fn invoke(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<TopicRequest>,
) -> Result<Json<TopicAnswer>, AppError> {
    if req.question.trim().is_empty() {
        return Err(AppError::BadRequest("question must not be empty".into()));
    }
    let answer = state.topic_router.invoke(&req.question).await?;
    Ok(Json(answer))
}
