//! 工具输入与决策格式的 JSON Schema（schemars 自动生成）
//!
//! 工具用它们声明输入格式；决策格式拼入推理提示词，减少模型输出格式错误。

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

/// search_tool / example_tool 的输入
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// 查询文本
    #[serde(default)]
    pub query: String,
    /// 类别：values / interests / strengths / questions，可选
    #[serde(default)]
    pub category: Option<String>,
}

/// guide_tool 的输入
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GuideInput {
    /// 步骤 id，缺省为当前步骤
    #[serde(default)]
    pub step: Option<String>,
}

/// 推理决策格式（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct DecisionFormat {
    /// use_tool / respond / guide
    action: String,
    /// action 为 use_tool 时必填
    tool_name: Option<String>,
    /// 工具输入
    tool_input: Option<Value>,
    /// 给用户的回复（respond / guide）
    response: Option<String>,
    /// 简短的决策理由
    rationale: Option<String>,
}

pub fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null)
}

/// 决策格式 JSON Schema 字符串
pub fn decision_schema_json() -> String {
    serde_json::to_string_pretty(&schema_for!(DecisionFormat)).unwrap_or_default()
}

/// 宽松解析工具输入：非对象或字段类型不符时返回默认值而不是报错
pub fn parse_input<T: for<'de> Deserialize<'de> + Default>(input: &Value) -> T {
    serde_json::from_value(input.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_schema_has_properties() {
        let v = schema_value::<QueryInput>();
        assert!(v["properties"]["query"].is_object());
        assert!(v["properties"]["category"].is_object());
    }

    #[test]
    fn test_decision_schema_mentions_action() {
        assert!(decision_schema_json().contains("tool_name"));
    }

    #[test]
    fn test_parse_input_lenient() {
        let g: GuideInput = parse_input(&serde_json::json!({"step": "strengths_exploration"}));
        assert_eq!(g.step.as_deref(), Some("strengths_exploration"));
        let g: GuideInput = parse_input(&serde_json::json!("oops"));
        assert!(g.step.is_none());
    }
}
