use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::debug;

use crate::{ParamSpec, Tool, ToolError};

/// One way of launching a camera application.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchCandidate {
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCandidate {
    pub fn new(label: &str, program: &str, args: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Opens the platform camera app; fire-and-forget.
///
/// Candidates are tried in order and the first one that spawns wins. The
/// launched process is never awaited.
pub struct CameraTool {
    candidates: Vec<LaunchCandidate>,
}

impl CameraTool {
    pub fn for_current_platform() -> Self {
        Self::with_candidates(platform_candidates(std::env::consts::OS))
    }

    pub fn with_candidates(candidates: Vec<LaunchCandidate>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[LaunchCandidate] {
        &self.candidates
    }
}

fn platform_candidates(os: &str) -> Vec<LaunchCandidate> {
    match os {
        "macos" => vec![
            LaunchCandidate::new("Photo Booth", "open", &["/System/Applications/Photo Booth.app"]),
            LaunchCandidate::new("QuickTime Player", "open", &["-a", "QuickTime Player"]),
        ],
        "windows" => vec![
            LaunchCandidate::new(
                "Windows Camera (PowerShell)",
                "powershell",
                &["-Command", "Start-Process", "microsoft.windows.camera:"],
            ),
            LaunchCandidate::new("Windows Camera (cmd)", "cmd", &["/c", "start", "microsoft.windows.camera:"]),
        ],
        _ => vec![
            LaunchCandidate::new("Cheese (xdg-open)", "xdg-open", &["cheese"]),
            LaunchCandidate::new("Cheese", "cheese", &[]),
        ],
    }
}

#[async_trait]
impl Tool for CameraTool {
    fn name(&self) -> &str {
        "open_camera"
    }

    fn description(&self) -> &str {
        "尝试打开本机的摄像头应用。"
    }

    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        let mut last_error = None;

        for candidate in &self.candidates {
            match Command::new(&candidate.program).args(&candidate.args).spawn() {
                Ok(_child) => {
                    return Ok(json!(format!("已尝试通过 {} 启动摄像头应用。", candidate.label)));
                }
                Err(e) => {
                    debug!("Camera candidate {} failed: {}", candidate.label, e);
                    last_error = Some(format!("{}: {}", candidate.label, e));
                }
            }
        }

        Err(ToolError::ExecutionFailed(match last_error {
            Some(detail) => format!("未能启动摄像头，应急信息: {}", detail),
            None => "未能成功启动摄像头应用。".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_platform_has_candidates() {
        for os in ["macos", "windows", "linux"] {
            assert_eq!(platform_candidates(os).len(), 2);
        }
        assert_eq!(platform_candidates("linux")[1].program, "cheese");
    }

    #[tokio::test]
    async fn all_candidates_failing_is_an_error() {
        let tool = CameraTool::with_candidates(vec![
            LaunchCandidate::new("missing", "mentor-no-such-camera-binary", &[]),
        ]);
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(ref m) if m.contains("missing")));
    }

    #[tokio::test]
    async fn no_candidates_is_an_error() {
        let err = CameraTool::with_candidates(Vec::new()).execute(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("未能成功启动摄像头应用"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn first_spawnable_candidate_wins() {
        let tool = CameraTool::with_candidates(vec![
            LaunchCandidate::new("missing", "mentor-no-such-camera-binary", &[]),
            LaunchCandidate::new("true", "true", &[]),
        ]);
        let out = tool.execute(json!({})).await.unwrap();
        assert!(out.as_str().unwrap().contains("true"));
    }
}
