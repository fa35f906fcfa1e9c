//! Guarded shell execution.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use mentor_config::ToolSettings;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::{info, warn};

use crate::{ParamSpec, Tool, ToolError};

const DANGEROUS_PATTERNS: &[&str] = &[
    "rm -rf", "rm -r", "rm -f", "sudo", "shutdown", "reboot", "halt", "mkfs", ":(){", "dd if=", ">/dev/",
];

/// Runs a command in the user's shell.
///
/// Without `allow_shell` the command is only echoed back. Commands matching
/// a dangerous pattern are refused even when execution is allowed.
pub struct ShellTool {
    allow: bool,
    timeout: Duration,
    shell: String,
}

impl ShellTool {
    pub fn new(settings: &ToolSettings) -> Self {
        Self {
            allow: settings.allow_shell,
            timeout: Duration::from_secs(settings.shell_timeout_secs),
            shell: std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string()),
        }
    }

    /// Returns the first dangerous pattern contained in `command`.
    pub fn blocked_pattern(command: &str) -> Option<&'static str> {
        let text = command.to_lowercase();
        DANGEROUS_PATTERNS.iter().copied().find(|p| text.contains(p))
    }

    async fn run(&self, command: &str) -> Result<(i32, String), ToolError> {
        let child = Command::new(&self.shell)
            .arg("-lc")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::ExecutionFailed(format!("failed to start {}: {}", self.shell, e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolError::ExecutionFailed(format!("command timed out after {:?}", self.timeout)))?
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok((output.status.code().unwrap_or(-1), text))
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "run_shell"
    }

    fn description(&self) -> &str {
        "在 shell 中执行命令（高危，受 ALLOW_SHELL 与黑名单保护）。"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::string("command").describe("需要在 shell 中执行的完整命令")]
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let command = args
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("'command' must be a string".into()))?;

        if !self.allow {
            return Ok(json!(format!(
                "[DRY-RUN] 由于未设置 ALLOW_SHELL=1，本次不执行，只展示将要运行的命令:\n$ {}",
                command
            )));
        }

        if let Some(pattern) = Self::blocked_pattern(command) {
            warn!("Refusing shell command containing '{}'", pattern);
            return Err(ToolError::ExecutionFailed(format!("[BLOCKED] 命令包含高危片段：{}", pattern)));
        }

        info!("Running shell command: {}", command);
        let (code, output) = self.run(command).await?;
        Ok(json!(format!("$ {}\n\n{}\n\n(exit={})", command, output.trim(), code)))
    }
}
