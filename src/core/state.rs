//! 单轮状态：TurnState（内部完整状态）与 TurnOutcome（返回给调用方的投影）
//!
//! TurnState 每次调用时创建、回复后丢弃；题目进度快照由调用方持久化后在下一轮传回。
//! 用户可见消息列表只由输出节点追加。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::AgentError;
use crate::memory::{Message, Role};
use crate::progress::{AnswerCard, ProgressMap, QuestionBrief};
use crate::react::decision::{ObservationDecision, ReasoningDecision};
use crate::react::profile::Profile;

/// 调用方传入的一轮请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnRequest {
    pub session_id: String,
    pub user_input: String,
    pub current_step: String,
    /// 当前题目此前的对话（不含本轮输入）
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub question_progress: ProgressMap,
    #[serde(default)]
    pub force_regenerate_card: bool,
    /// 覆盖本轮的单步骤轮数上限
    #[serde(default)]
    pub max_rounds_per_step: Option<u32>,
}

impl TurnRequest {
    pub fn new(
        session_id: impl Into<String>,
        user_input: impl Into<String>,
        current_step: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_input: user_input.into(),
            current_step: current_step.into(),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_progress(mut self, progress: ProgressMap) -> Self {
        self.question_progress = progress;
        self
    }

    pub fn with_force_regenerate(mut self, force: bool) -> Self {
        self.force_regenerate_card = force;
        self
    }
}

/// 事件日志条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub done: bool,
    pub meta: Value,
    pub at: String,
}

/// 一次工具调用的记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub tool: String,
    pub input: Value,
    pub output: Value,
}

/// 节点之间共享的上下文
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    pub last_decision: Option<ReasoningDecision>,
    /// 本轮循环中刚执行的工具结果，观察节点消费后清空
    pub pending_tool_result: Option<ToolResult>,
    pub last_tool_result: Option<Value>,
    pub last_observation: Option<ObservationDecision>,
    /// 每个步骤的滚动摘要
    pub summaries: HashMap<String, String>,
    pub profile: Profile,
    pub step_rounds: HashMap<String, u32>,
    pub max_rounds_per_step: Option<u32>,
    pub knowledge_snippets: Vec<String>,
    pub question_brief: Option<QuestionBrief>,
    /// 首次推理时的准备工作是否已完成
    pub prepared: bool,
}

/// 单轮内部状态
#[derive(Debug, Clone)]
pub struct TurnState {
    pub session_id: String,
    pub user_input: String,
    pub current_step: String,
    /// 用户可见消息（调用方历史 + 本轮输入 + 输出节点写入的一条回复）
    pub messages: Vec<Message>,
    /// 内部推理轨迹，以调用方历史开头，超过上限时由压缩器折叠
    pub inner_messages: Vec<Message>,
    pub logs: Vec<LogEntry>,
    pub context: TurnContext,
    pub tools_used: Vec<String>,
    pub tool_results: Vec<ToolResult>,
    pub iteration_count: u32,
    pub should_continue: bool,
    pub final_response: Option<String>,
    pub error: Option<String>,
    pub answer_card: Option<AnswerCard>,
    pub question_progress: ProgressMap,
    pub force_regenerate_card: bool,
}

impl TurnState {
    pub fn new(request: TurnRequest) -> Self {
        let inner_messages: Vec<Message> = request
            .history
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect();
        let mut messages = request.history;
        if !request.user_input.trim().is_empty() {
            messages.push(Message::user(request.user_input.clone()));
        }
        Self {
            session_id: request.session_id,
            user_input: request.user_input,
            current_step: request.current_step,
            messages,
            inner_messages,
            logs: Vec::new(),
            context: TurnContext {
                max_rounds_per_step: request.max_rounds_per_step,
                ..Default::default()
            },
            tools_used: Vec::new(),
            tool_results: Vec::new(),
            iteration_count: 0,
            should_continue: true,
            final_response: None,
            error: None,
            answer_card: None,
            question_progress: request.question_progress,
            force_regenerate_card: request.force_regenerate_card,
        }
    }

    pub fn log(&mut self, message: impl Into<String>, meta: Value) {
        self.push_log(message.into(), false, meta);
    }

    pub fn log_done(&mut self, message: impl Into<String>, meta: Value) {
        self.push_log(message.into(), true, meta);
    }

    fn push_log(&mut self, message: String, done: bool, meta: Value) {
        self.logs.push(LogEntry {
            message,
            done,
            meta,
            at: chrono::Utc::now().to_rfc3339(),
        });
    }

    /// 记录错误并结束循环
    pub fn fail(&mut self, err: AgentError) {
        tracing::warn!(session = %self.session_id, error = %err, "turn failed");
        let msg = err.to_string();
        self.log_done(msg.clone(), serde_json::json!({ "error": true }));
        self.error = Some(msg);
        self.should_continue = false;
    }

    /// 结束循环并给出最终回复
    pub fn finish(&mut self, response: impl Into<String>) {
        self.final_response = Some(response.into());
        self.should_continue = false;
    }

    pub fn step_rounds(&self) -> u32 {
        self.context
            .step_rounds
            .get(&self.current_step)
            .copied()
            .unwrap_or(0)
    }

    pub fn current_summary(&self) -> Option<&str> {
        self.context
            .summaries
            .get(&self.current_step)
            .map(String::as_str)
    }

    /// 投影为返回给调用方的结果
    pub fn into_outcome(self) -> TurnOutcome {
        let response = self
            .messages
            .last()
            .filter(|m| !m.is_user())
            .map(|m| m.content.clone())
            .unwrap_or_default();
        TurnOutcome {
            session_id: self.session_id,
            response,
            messages: self.messages,
            question_progress: self.question_progress,
            answer_card: self.answer_card,
            logs: self.logs,
            tools_used: self.tools_used,
            error: self.error,
            iterations: self.iteration_count,
            summaries: self.context.summaries,
            profile: self.context.profile,
        }
    }
}

/// 一轮的结果：调用方据此持久化进度、展示回复与答题卡
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub session_id: String,
    pub response: String,
    pub messages: Vec<Message>,
    pub question_progress: ProgressMap,
    pub answer_card: Option<AnswerCard>,
    pub logs: Vec<LogEntry>,
    pub tools_used: Vec<String>,
    pub error: Option<String>,
    pub iterations: u32,
    pub summaries: HashMap<String, String>,
    pub profile: Profile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_seeds_user_message() {
        let req = TurnRequest::new("s", "我喜欢画画", "values_exploration")
            .with_history(vec![Message::assistant("你好")]);
        let st = TurnState::new(req);
        assert_eq!(st.messages.len(), 2);
        assert!(st.messages[1].is_user());
        assert!(st.should_continue);
        assert_eq!(st.iteration_count, 0);
        // 本轮输入由推理节点首次进入时追加
        assert_eq!(st.inner_messages.len(), 1);
        assert_eq!(st.inner_messages[0].content, "你好");
    }

    #[test]
    fn test_fail_sets_error_and_stops() {
        let mut st = TurnState::new(TurnRequest::new("s", "hi", "values_exploration"));
        st.fail(AgentError::ToolNotFound("x".into()));
        assert_eq!(st.error.as_deref(), Some("工具不存在: x"));
        assert!(!st.should_continue);
        assert!(st.logs.last().unwrap().done);
    }

    #[test]
    fn test_outcome_response_is_last_assistant_message() {
        let mut st = TurnState::new(TurnRequest::new("s", "hi", "values_exploration"));
        let out = st.clone().into_outcome();
        assert_eq!(out.response, "");
        st.messages.push(Message::assistant("你好呀"));
        assert_eq!(st.into_outcome().response, "你好呀");
    }
}
