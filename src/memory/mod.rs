//! 消息层：对话消息类型与对话记录工具函数

pub mod conversation;

pub use conversation::{recent_user_messages, render_transcript, Message, Role};
