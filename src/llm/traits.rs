//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容、DeepSeek、Mock）实现 LlmClient：chat 返回整段文本，
//! chat_stream 返回文本片段流。温度由调用方按节点决定。

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{stream, Stream};
use thiserror::Error;

use crate::memory::Message;

/// 文本片段流
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// 模型调用失败（网络、接口返回异常、空响应）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("LLM request timed out")]
    Timeout,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 一次性补全
    async fn chat(&self, messages: &[Message], temperature: f32) -> Result<String, LlmError>;

    /// 流式补全；默认实现退化为一次 chat，整段作为单个片段返回
    async fn chat_stream(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<ChatStream, LlmError> {
        let content = self.chat(messages, temperature).await?;
        Ok(Box::pin(stream::iter(vec![Ok(content)])))
    }

    /// 累计 token 使用 (prompt, completion, total)
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
