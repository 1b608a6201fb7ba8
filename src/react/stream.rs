//! 流式决策分隔
//!
//! 推理节点流式输出时，模型先写给用户看的自然语言，再写分隔标记，最后写 JSON 决策。
//! 标记之前的片段立即转发，之后的内容缓冲起来用于解析。标记可能被切在两个片段之间，
//! 所以末尾留出 marker.len() - 1 字节暂不转发。

pub const DECISION_MARKER: &str = "<<<DECISION>>>";

#[derive(Debug, Default)]
pub struct MarkerSplitter {
    pending: String,
    prefix: String,
    decision: String,
    seen_marker: bool,
    /// 模型直接输出 JSON（没有前导文本）时不转发任何内容
    json_only: bool,
}

impl MarkerSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 喂入一个片段，返回可以立即转发给用户的文本（可能为空）
    pub fn push(&mut self, fragment: &str) -> String {
        if self.seen_marker {
            self.decision.push_str(fragment);
            return String::new();
        }
        self.pending.push_str(fragment);
        if self.prefix.is_empty() && !self.json_only {
            let head = self.pending.trim_start();
            if head.starts_with('{') || head.starts_with("```") {
                self.json_only = true;
            }
        }
        if let Some(pos) = self.pending.find(DECISION_MARKER) {
            let emit = self.pending[..pos].to_string();
            self.decision
                .push_str(&self.pending[pos + DECISION_MARKER.len()..]);
            self.pending.clear();
            self.seen_marker = true;
            self.prefix.push_str(&emit);
            return emit;
        }
        let keep = DECISION_MARKER.len() - 1;
        if self.json_only || self.pending.len() <= keep {
            return String::new();
        }
        let mut cut = self.pending.len() - keep;
        while !self.pending.is_char_boundary(cut) {
            cut -= 1;
        }
        let emit: String = self.pending.drain(..cut).collect();
        self.prefix.push_str(&emit);
        emit
    }

    /// 流结束：返回尚未转发的尾部、全部转发文本（含尾部）与决策部分。
    /// 没有出现标记时整段都视为决策输入；纯 JSON 输出的尾部不转发。
    pub fn finish(mut self) -> SplitOutput {
        if self.seen_marker {
            return SplitOutput {
                tail: String::new(),
                prefix: self.prefix,
                decision: self.decision,
                had_marker: true,
            };
        }
        let pending = std::mem::take(&mut self.pending);
        let decision = format!("{}{}", self.prefix, pending);
        let tail = if self.json_only { String::new() } else { pending };
        self.prefix.push_str(&tail);
        SplitOutput {
            tail,
            prefix: self.prefix,
            decision,
            had_marker: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutput {
    pub tail: String,
    pub prefix: String,
    pub decision: String,
    pub had_marker: bool,
}

/// 非流式输出的同样拆分
pub fn split_decision(full: &str) -> (&str, &str) {
    match full.find(DECISION_MARKER) {
        Some(pos) => (&full[..pos], &full[pos + DECISION_MARKER.len()..]),
        None => ("", full),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(chunks: &[&str]) -> (String, SplitOutput) {
        let mut s = MarkerSplitter::new();
        let mut emitted = String::new();
        for c in chunks {
            emitted.push_str(&s.push(c));
        }
        (emitted, s.finish())
    }

    #[test]
    fn test_marker_split_across_fragments() {
        let (emitted, out) = run(&["听起来", "很有意义。<<<DEC", "ISION>>>{\"action\":", "\"respond\"}"]);
        assert_eq!(emitted, "听起来很有意义。");
        assert_eq!(out.prefix, "听起来很有意义。");
        assert_eq!(out.decision, "{\"action\":\"respond\"}");
        assert!(out.had_marker);
    }

    #[test]
    fn test_text_before_marker_streams_early() {
        let mut s = MarkerSplitter::new();
        let first = s.push("这是一段足够长的前导文本，用来验证会提前转发");
        assert!(!first.is_empty());
        assert!(!first.contains('<'));
    }

    #[test]
    fn test_no_marker_everything_is_decision() {
        let (emitted, out) = run(&["{\"action\":\"respond\",", "\"response\":\"hi\"}"]);
        assert!(emitted.is_empty(), "纯 JSON 输出不应转发给用户");
        assert_eq!(out.decision, "{\"action\":\"respond\",\"response\":\"hi\"}");
        assert!(!out.had_marker);
        assert!(out.tail.is_empty());
        assert!(out.prefix.is_empty());
    }

    #[test]
    fn test_plain_text_without_marker_keeps_tail() {
        let full = "听起来那段支教经历对你意义很大，能说说最难忘的一刻吗？";
        let (emitted, out) = run(&["听起来那段", "支教经历对你意义很大，", "能说说最难忘的一刻吗？"]);
        assert!(!out.had_marker);
        assert!(out.tail.ends_with("的一刻吗？"));
        assert_eq!(format!("{}{}", emitted, out.tail), full);
        assert_eq!(out.prefix, full);
        assert_eq!(out.decision, full);
    }

    #[test]
    fn test_split_decision() {
        assert_eq!(split_decision("hi<<<DECISION>>>{}"), ("hi", "{}"));
        assert_eq!(split_decision("{}"), ("", "{}"));
    }
}
