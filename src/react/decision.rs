//! 结构化决策解析
//!
//! 推理节点与观察节点都要求模型返回 JSON；先按严格结构解码，失败则构造纯文本兜底变体，
//! 保证一次无法解析的输出不会让本轮失败。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::AgentError;

/// 从模型输出中提取 JSON 块（```json ... ``` 或首个 `{` 到最后一个 `}`）
pub fn extract_json_block(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        return Some(rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim()));
    }
    if let Some(start) = trimmed.find("```") {
        let rest = &trimmed[start + 3..];
        if let Some(end) = rest.find("```") {
            let inner = rest[..end].trim();
            if inner.starts_with('{') {
                return Some(inner);
            }
        }
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

/// 推理节点决策：{"action": "use_tool" | "respond" | "guide", ...}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReasoningDecision {
    UseTool {
        #[serde(default)]
        tool_name: Option<String>,
        #[serde(default)]
        tool_input: Value,
        #[serde(default, alias = "reasoning")]
        rationale: String,
    },
    Respond {
        #[serde(default)]
        response: String,
        #[serde(default, alias = "reasoning")]
        rationale: String,
    },
    Guide {
        #[serde(default)]
        response: String,
        #[serde(default, alias = "reasoning")]
        rationale: String,
    },
}

impl ReasoningDecision {
    /// 严格解码
    pub fn parse(output: &str) -> Result<Self, AgentError> {
        let json = extract_json_block(output)
            .ok_or_else(|| AgentError::JsonParse("no JSON object in reasoning output".into()))?;
        serde_json::from_str(json).map_err(|e| AgentError::JsonParse(format!("{}: {}", e, json)))
    }

    /// 无法解析时的降级：整段文本当作直接回复
    pub fn text_only(output: &str) -> Self {
        ReasoningDecision::Respond {
            response: output.trim().to_string(),
            rationale: String::new(),
        }
    }

    pub fn action_name(&self) -> &'static str {
        match self {
            ReasoningDecision::UseTool { .. } => "use_tool",
            ReasoningDecision::Respond { .. } => "respond",
            ReasoningDecision::Guide { .. } => "guide",
        }
    }

    /// 回复文本为空时用流式阶段已经输出的前导文本补齐
    pub fn fill_empty_response(&mut self, text: &str) {
        if let ReasoningDecision::Respond { response, .. } | ReasoningDecision::Guide { response, .. } = self {
            if response.trim().is_empty() {
                *response = text.trim().to_string();
            }
        }
    }
}

/// 观察节点决策
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservationDecision {
    #[serde(default)]
    pub should_continue: bool,
    #[serde(default)]
    pub next_action: Option<String>,
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub response: Option<String>,
}

impl ObservationDecision {
    pub fn parse(output: &str) -> Result<Self, AgentError> {
        let json = extract_json_block(output)
            .ok_or_else(|| AgentError::JsonParse("no JSON object in observation output".into()))?;
        serde_json::from_str(json).map_err(|e| AgentError::JsonParse(format!("{}: {}", e, json)))
    }

    pub fn parse_or_fallback(output: &str) -> Self {
        match Self::parse(output) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "observation output not structured, ending with raw text");
                Self {
                    should_continue: false,
                    next_action: None,
                    analysis: String::new(),
                    response: Some(output.trim().to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_block_variants() {
        assert_eq!(extract_json_block("```json\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        assert_eq!(extract_json_block("```\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        assert_eq!(extract_json_block("好的 {\"a\":1} 结束"), Some("{\"a\":1}"));
        assert_eq!(extract_json_block("no json here"), None);
        assert_eq!(extract_json_block("} reversed {"), None);
    }

    #[test]
    fn test_parse_use_tool() {
        let d = ReasoningDecision::parse(
            r#"{"action":"use_tool","tool_name":"search_tool","tool_input":{"query":"诚实"},"reasoning":"需要查资料"}"#,
        )
        .unwrap();
        match d {
            ReasoningDecision::UseTool { tool_name, tool_input, rationale } => {
                assert_eq!(tool_name.as_deref(), Some("search_tool"));
                assert_eq!(tool_input["query"], "诚实");
                assert_eq!(rationale, "需要查资料");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_use_tool_without_name_is_still_structured() {
        let d = ReasoningDecision::parse(r#"{"action":"use_tool"}"#).unwrap();
        assert!(matches!(d, ReasoningDecision::UseTool { tool_name: None, .. }));
    }

    #[test]
    fn test_unknown_action_is_not_structured() {
        let raw = r#"{"action":"dance","response":"hi"}"#;
        assert!(matches!(ReasoningDecision::parse(raw), Err(AgentError::JsonParse(_))));
    }

    #[test]
    fn test_plain_text_falls_back_to_respond() {
        assert!(ReasoningDecision::parse("  能多说说吗？ ").is_err());
        let d = ReasoningDecision::text_only("  能多说说吗？ ");
        assert_eq!(
            d,
            ReasoningDecision::Respond { response: "能多说说吗？".into(), rationale: String::new() }
        );
    }

    #[test]
    fn test_fill_empty_response() {
        let mut d = ReasoningDecision::parse(r#"{"action":"respond"}"#).unwrap();
        d.fill_empty_response(" 听起来很有意义。 ");
        assert_eq!(
            d,
            ReasoningDecision::Respond { response: "听起来很有意义。".into(), rationale: String::new() }
        );
    }

    #[test]
    fn test_observation_fallback() {
        let d = ObservationDecision::parse_or_fallback("工具结果看起来不错");
        assert!(!d.should_continue);
        assert_eq!(d.response.as_deref(), Some("工具结果看起来不错"));

        let d = ObservationDecision::parse_or_fallback(
            r#"{"should_continue":true,"analysis":"用户重视诚实"}"#,
        );
        assert!(d.should_continue);
        assert_eq!(d.analysis, "用户重视诚实");
        assert!(d.response.is_none());
    }
}
