//! Host overview: CPU, memory, system disk and today's date.

use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};
use sysinfo::{Disks, System};

use crate::{ParamSpec, Tool, ToolError};

const UNKNOWN: &str = "未知";

/// Formats a byte count with binary units and two decimals.
///
/// Zero or missing sizes render as `未知`.
pub fn format_bytes(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes.filter(|&b| b > 0) else {
        return UNKNOWN.to_string();
    };

    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} PB", value)
}

/// Snapshot of the host taken by [`SystemInfoTool`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemOverview {
    pub cpu: String,
    pub total_memory: Option<u64>,
    pub system_disk: Option<u64>,
    pub date: String,
}

impl SystemOverview {
    /// Probes the current host. Blocking.
    pub fn probe() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        let cpu = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| std::env::consts::ARCH.to_string());

        let total_memory = Some(sys.total_memory()).filter(|&m| m > 0);

        let disks = Disks::new_with_refreshed_list();
        let system_disk = disks
            .list()
            .iter()
            .find(|d| d.mount_point().to_str() == Some("/"))
            .or_else(|| disks.list().first())
            .map(|d| d.total_space());

        Self {
            cpu,
            total_memory,
            system_disk,
            date: Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "CPU: {}\n内存总量: {}\n系统盘容量: {}\n今天日期: {}",
            self.cpu,
            format_bytes(self.total_memory),
            format_bytes(self.system_disk),
            self.date
        )
    }
}

/// Reports CPU brand, total memory, system disk capacity and the date.
pub struct SystemInfoTool;

#[async_trait]
impl Tool for SystemInfoTool {
    fn name(&self) -> &str {
        "system_info"
    }

    fn description(&self) -> &str {
        "查询本机 CPU 型号、内存总量、系统盘容量以及今天的日期。"
    }

    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        let overview = tokio::task::spawn_blocking(SystemOverview::probe)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("system probe failed: {}", e)))?;
        Ok(json!(overview.render()))
    }
}
