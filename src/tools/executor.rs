//! 工具执行器
//!
//! 持有共享的 ToolRegistry 与单次调用超时；execute 查找并调用工具，
//! 查找失败、工具报错、超时都转为 AgentError，每次调用输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;

use crate::core::state::TurnState;
use crate::core::AgentError;
use crate::tools::{Tool, ToolRegistry};

/// 工具执行器：对每次调用施加超时，并将结果映射为 AgentError
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_timeout(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.registry.get(name)
    }

    /// 执行指定工具；未注册返回 ToolNotFound，超时返回 ToolTimeout，工具返回 Err 则转为 ToolExecution
    pub async fn execute(
        &self,
        tool_name: &str,
        input: Value,
        state: &TurnState,
    ) -> Result<Value, AgentError> {
        let Some(tool) = self.registry.get(tool_name) else {
            audit(tool_name, "not_found", 0, &input, &state.session_id);
            return Err(AgentError::ToolNotFound(tool_name.to_string()));
        };

        let start = Instant::now();
        let result = timeout(self.timeout, tool.execute(input.clone(), state)).await;
        let outcome = match &result {
            Ok(Ok(_)) => "ok",
            Ok(Err(_)) => "error",
            Err(_) => "timeout",
        };
        audit(
            tool_name,
            outcome,
            start.elapsed().as_millis() as u64,
            &input,
            &state.session_id,
        );

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(AgentError::ToolExecution(e)),
            Err(_) => Err(AgentError::ToolTimeout(tool_name.to_string())),
        }
    }
}

fn audit(tool: &str, outcome: &str, duration_ms: u64, input: &Value, session: &str) {
    let audit = serde_json::json!({
        "event": "tool_audit",
        "tool": tool,
        "ok": outcome == "ok",
        "outcome": outcome,
        "duration_ms": duration_ms,
        "session": session,
        "input_preview": input_preview(input),
    });
    tracing::info!(audit = %audit.to_string(), "tool");
}

fn input_preview(input: &Value) -> String {
    let s = input.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
