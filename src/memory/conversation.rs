//! 对话消息：角色与单条消息
//!
//! 用户可见的消息列表、内部推理轨迹、调用方传入的题目对话记录都使用同一种 Message。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// 取最近 n 条用户消息（保持原有先后顺序）
pub fn recent_user_messages(messages: &[Message], n: usize) -> Vec<&Message> {
    let mut picked: Vec<&Message> = messages.iter().rev().filter(|m| m.is_user()).take(n).collect();
    picked.reverse();
    picked
}

/// 将对话渲染为「用户：… / 咨询师：…」文本，供提示词使用
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let label = if m.is_user() { "用户" } else { "咨询师" };
            format!("{}：{}", label, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_user_messages_keeps_order() {
        let msgs = vec![
            Message::user("a"),
            Message::assistant("x"),
            Message::user("b"),
            Message::user("c"),
            Message::user("d"),
        ];
        let picked: Vec<&str> = recent_user_messages(&msgs, 3)
            .into_iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(picked, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_render_transcript_skips_system() {
        let msgs = vec![
            Message::system("rules"),
            Message::assistant("你好"),
            Message::user("我喜欢帮助别人"),
        ];
        assert_eq!(render_transcript(&msgs), "咨询师：你好\n用户：我喜欢帮助别人");
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(json.contains("\"user\""));
    }
}
