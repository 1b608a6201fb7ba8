//! 过程事件：用于流式展示思考、工具调用、观察与回复

use serde::Serialize;
use tokio::sync::mpsc;

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReactEvent {
    /// 进入某个节点
    Node { name: String },
    /// 正在调用模型思考
    Thinking { iteration: u32 },
    /// 调用工具
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回与分析（预览，避免过长）
    Observation { tool: String, preview: String },
    /// 上下文被折叠
    ContextFolded { before: usize, after: usize },
    /// 回复的一小段（流式输出，已推送的不会撤回）
    MessageChunk { text: String },
    /// 答题卡生成
    AnswerCard { question_id: Option<u32> },
    /// 本轮唯一的用户可见回复（以此为准）
    Reply { text: String },
    /// 回复结束
    MessageDone,
    Error { text: String },
}

pub type StreamSink = mpsc::UnboundedSender<ReactEvent>;

/// 若有 sink 则发送事件；接收端已关闭时静默忽略
pub(crate) fn send_event(sink: Option<&StreamSink>, event: ReactEvent) {
    if let Some(tx) = sink {
        let _ = tx.send(event);
    }
}

/// 预览：按字符截断
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
