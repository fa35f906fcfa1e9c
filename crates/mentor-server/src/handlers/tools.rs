//! Tool listing endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use mentor_core::ToolSchema;

use crate::ServerState;

/// Returns the schema of every registered tool, in registration order.
pub async fn list(State(state): State<Arc<ServerState>>) -> Json<Vec<ToolSchema>> {
    Json(state.assistant.registry().schemas())
}
