//! 上下文压缩
//!
//! 内部推理轨迹超过上限时，把较早部分的文本拼接、截断后折叠为一条摘要消息，
//! 保留最近 keep_latest 条原样。不调用模型。

use crate::memory::Message;

pub const SUMMARY_PREFIX: &str = "[Summary of earlier conversation]";
pub const TRUNCATED_MARKER: &str = "\n...[truncated]";

/// 一次折叠的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldReport {
    pub before: usize,
    pub after: usize,
}

#[derive(Debug, Clone)]
pub struct ContextCompressor {
    max_messages: usize,
    keep_latest: usize,
    fold_max_chars: usize,
}

impl Default for ContextCompressor {
    fn default() -> Self {
        Self::new(40, 20, 2000)
    }
}

impl ContextCompressor {
    /// keep_latest 会被收紧到 max_messages - 1 以内，保证折叠后长度不超过上限
    pub fn new(max_messages: usize, keep_latest: usize, fold_max_chars: usize) -> Self {
        let max_messages = max_messages.max(1);
        Self {
            max_messages,
            keep_latest: keep_latest.min(max_messages - 1),
            fold_max_chars,
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn keep_latest(&self) -> usize {
        self.keep_latest
    }

    /// 原地压缩；未触发时返回 None
    pub fn compress(&self, messages: &mut Vec<Message>) -> Option<FoldReport> {
        let before = messages.len();
        if before <= self.max_messages {
            return None;
        }
        let split = before - self.keep_latest;
        let text = messages[..split]
            .iter()
            .map(|m| m.content.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return None;
        }

        let snippet = if text.chars().count() > self.fold_max_chars {
            let head: String = text.chars().take(self.fold_max_chars).collect();
            format!("{}{}", head, TRUNCATED_MARKER)
        } else {
            text
        };

        let latest = messages.split_off(split);
        messages.clear();
        messages.push(Message::assistant(format!("{}\n{}", SUMMARY_PREFIX, snippet)));
        messages.extend(latest);

        let report = FoldReport {
            before,
            after: messages.len(),
        };
        tracing::info!(before = report.before, after = report.after, "context folded");
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(n: usize) -> Vec<Message> {
        (0..n).map(|i| Message::user(format!("m{i}"))).collect()
    }

    #[test]
    fn test_no_fold_at_or_below_ceiling() {
        let c = ContextCompressor::default();
        let mut msgs = trace(40);
        assert!(c.compress(&mut msgs).is_none());
        assert_eq!(msgs.len(), 40);
    }

    #[test]
    fn test_fold_yields_keep_plus_one_and_is_idempotent() {
        let c = ContextCompressor::new(10, 4, 2000);
        for n in [11, 15, 50] {
            let mut msgs = trace(n);
            let report = c.compress(&mut msgs).unwrap();
            assert_eq!(report, FoldReport { before: n, after: 5 });
            assert_eq!(msgs.len(), 5);
            assert!(msgs[0].content.starts_with(SUMMARY_PREFIX));
            assert_eq!(msgs[4].content, format!("m{}", n - 1));
            assert!(c.compress(&mut msgs).is_none());
        }
    }

    #[test]
    fn test_fold_keeps_head_and_marks_truncation() {
        let c = ContextCompressor::new(2, 1, 5);
        let mut msgs = vec![
            Message::user("abcdefgh"),
            Message::assistant("ijk"),
            Message::user("latest"),
        ];
        c.compress(&mut msgs).unwrap();
        assert_eq!(msgs[0].content, format!("{}\nabcde{}", SUMMARY_PREFIX, TRUNCATED_MARKER));
        assert_eq!(msgs[1].content, "latest");
    }

    #[test]
    fn test_blank_early_segment_not_folded() {
        let c = ContextCompressor::new(2, 1, 100);
        let mut msgs = vec![Message::user("  "), Message::assistant(""), Message::user("x")];
        assert!(c.compress(&mut msgs).is_none());
        assert_eq!(msgs.len(), 3);
    }

    #[test]
    fn test_keep_latest_clamped() {
        let c = ContextCompressor::new(3, 10, 100);
        assert_eq!(c.keep_latest(), 2);
        let mut msgs = trace(5);
        c.compress(&mut msgs).unwrap();
        assert_eq!(msgs.len(), 3);
    }
}
