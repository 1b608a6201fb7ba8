//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! - MockLlmClient：把最后一条 User 消息包装成 respond 决策回显
//! - ScriptedLlmClient：按顺序返回预设回复，并记录每次请求，便于断言提示词内容

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;

use crate::llm::traits::{ChatStream, LlmClient, LlmError};
use crate::memory::{Message, Role};

/// Mock 客户端：回显用户最后一条消息
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(&self, messages: &[Message], _temperature: f32) -> Result<String, LlmError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        let decision = serde_json::json!({
            "action": "respond",
            "response": format!("我听到了：{}。能再多说一点吗？", last_user),
            "rationale": "mock echo",
        });
        Ok(decision.to_string())
    }
}

/// 一次被记录下来的请求
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub temperature: f32,
}

/// 脚本化客户端：每次调用弹出队首回复；队列耗尽后返回 EmptyResponse
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    /// 流式调用时每个片段的字符数（0 表示整段一次返回）
    chunk_chars: usize,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|s| Ok(s.into())).collect()),
            requests: Mutex::new(Vec::new()),
            chunk_chars: 0,
        }
    }

    /// 流式输出时按固定字符数切片，用于测试分隔标记跨片段的情况
    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars;
        self
    }

    /// 在队尾追加一次失败
    pub fn push_error(&self, err: LlmError) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(Err(err));
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(Ok(reply.into()));
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|q| q.len()).unwrap_or(0)
    }

    fn next_reply(&self, messages: &[Message], temperature: f32) -> Result<String, LlmError> {
        if let Ok(mut r) = self.requests.lock() {
            r.push(RecordedRequest {
                messages: messages.to_vec(),
                temperature,
            });
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn chat(&self, messages: &[Message], temperature: f32) -> Result<String, LlmError> {
        self.next_reply(messages, temperature)
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<ChatStream, LlmError> {
        let content = self.next_reply(messages, temperature)?;
        if self.chunk_chars == 0 {
            return Ok(Box::pin(stream::iter(vec![Ok(content)])));
        }
        let chars: Vec<char> = content.chars().collect();
        let pieces: Vec<Result<String, LlmError>> = chars
            .chunks(self.chunk_chars)
            .map(|c| Ok(c.iter().collect::<String>()))
            .collect();
        Ok(Box::pin(stream::iter(pieces)))
    }
}
