//! Executes tool calls and turns every outcome into a [`ToolResult`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use mentor_core::{ToolCallRequest, ToolFailure, ToolResult};
use serde_json::Value;
use tracing::{info, warn};

use crate::validate::validate_arguments;
use crate::ToolRegistry;

/// Runs tool calls against a shared registry.
///
/// Failures (unknown tool, bad arguments, execution errors, panics) are
/// recorded in the returned [`ToolResult`] and never propagated, so the
/// conversation can continue with an explanation. Side effects of the
/// tools themselves are not sandboxed.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Validates and executes one call.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> ToolResult {
        let tool = match self.registry.lookup(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!("║       ⚠ {}", e);
                return ToolResult::failure(call, ToolFailure::NotFound, e.to_string());
            }
        };

        if let Err(e) = validate_arguments(&tool.params(), &call.arguments) {
            warn!("║       ⚠ {} rejected: {}", call.name, e);
            return ToolResult::failure(call, ToolFailure::InvalidArguments, e.to_string());
        }

        let args = match &call.arguments {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };

        info!("║       → Executing tool: {}", call.name);
        let start = Instant::now();

        match AssertUnwindSafe(tool.execute(args)).catch_unwind().await {
            Ok(Ok(payload)) => {
                info!("║       ← Tool {} succeeded in {:?}", call.name, start.elapsed());
                ToolResult::success(call, payload)
            }
            Ok(Err(e)) => {
                warn!("║       ⚠ Tool {} failed: {}", call.name, e);
                ToolResult::failure(call, e.failure_kind(), e.to_string())
            }
            Err(_) => {
                warn!("║       ⚠ Tool {} panicked", call.name);
                ToolResult::failure(call, ToolFailure::ExecutionFailed, format!("tool '{}' panicked", call.name))
            }
        }
    }
}
