//! 编排错误类型
//!
//! 节点内部捕获自己的错误，写入本轮状态的 error 字段并结束循环；错误不会越过节点边界。

use thiserror::Error;

use crate::llm::LlmError;

/// 一轮对话中可能出现的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// 模型调用失败（网络 / 接口）；输出无法解析不算错误，会降级为纯文本
    #[error("模型调用失败: {0}")]
    ModelInvocation(#[from] LlmError),

    #[error("工具名称未指定")]
    MissingToolName,

    #[error("工具不存在: {0}")]
    ToolNotFound(String),

    #[error("工具执行失败: {0}")]
    ToolExecution(String),

    #[error("工具执行超时: {0}")]
    ToolTimeout(String),

    /// 答题卡分析失败；仅记录，调用方回退到朴素拼接
    #[error("回答分析失败: {0}")]
    SufficiencyAnalysis(String),

    #[error("JSON 解析失败: {0}")]
    JsonParse(String),

    #[error("内容加载失败: {0}")]
    Content(String),

    #[error("配置错误: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_not_found_message() {
        let e = AgentError::ToolNotFound("web_search".into());
        assert_eq!(e.to_string(), "工具不存在: web_search");
    }

    #[test]
    fn test_llm_error_converts() {
        let e: AgentError = LlmError::Timeout.into();
        assert!(matches!(e, AgentError::ModelInvocation(LlmError::Timeout)));
    }
}
