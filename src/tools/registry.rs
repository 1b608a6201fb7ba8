//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / input_schema / execute），由 ToolRegistry 按名注册与查找，
//! ToolExecutor 在调用时加超时并统一转 AgentError。注册后整体以 Arc 共享，只读。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::state::TurnState;

/// 工具 trait：名称、描述（供模型理解）、输入 schema、异步执行（输入输出均为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 输入 JSON Schema；默认不限参数
    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具；可读取本轮状态（当前步骤等）
    async fn execute(&self, input: Value, state: &TurnState) -> Result<Value, String>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，同名注册后者覆盖前者
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::debug!(tool = %name, "tool re-registered, previous entry replaced");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// 名称排序，保证提示词稳定
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// (name, description) 列表，用于生成提示词中的可用工具段落
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.tool_names()
            .into_iter()
            .filter_map(|n| self.tools.get(&n).map(|t| (n.clone(), t.description().to_string())))
            .collect()
    }

    /// 工具 schema JSON（名称、描述、输入 schema）
    pub fn to_schema_json(&self) -> String {
        let tools: Vec<Value> = self
            .tool_names()
            .into_iter()
            .filter_map(|n| self.tools.get(&n).cloned())
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "input_schema": tool.input_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::TurnRequest;

    struct Fixed(&'static str, &'static str);

    #[async_trait]
    impl Tool for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            self.1
        }

        async fn execute(&self, _input: Value, _state: &TurnState) -> Result<Value, String> {
            Ok(Value::String(self.1.to_string()))
        }
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut reg = ToolRegistry::new();
        reg.register(Fixed("t", "first"));
        reg.register(Fixed("t", "second"));
        assert_eq!(reg.len(), 1);
        let state = TurnState::new(TurnRequest::new("s", "hi", "values_exploration"));
        let out = reg.get("t").unwrap().execute(Value::Null, &state).await.unwrap();
        assert_eq!(out, Value::String("second".into()));
    }

    #[test]
    fn test_names_sorted_and_schema_json() {
        let mut reg = ToolRegistry::new();
        reg.register(Fixed("b", "B"));
        reg.register(Fixed("a", "A"));
        assert_eq!(reg.tool_names(), vec!["a", "b"]);
        let schema: Value = serde_json::from_str(&reg.to_schema_json()).unwrap();
        assert_eq!(schema[0]["name"], "a");
        assert_eq!(schema[1]["input_schema"]["type"], "object");
        assert!(reg.get("c").is_none());
    }
}
