//! 轻量画像：观察节点的分析笔记、步骤滚动摘要与粗粒度矛盾检测
//!
//! 矛盾检测只比较最近两条笔记：同一话题关键词下出现相反倾向即记录一条矛盾。

use serde::{Deserialize, Serialize};

/// 话题关键词
const TOPIC_KEYWORDS: &[&str] = &[
    "工作", "家庭", "家人", "金钱", "收入", "自由", "稳定", "团队", "独处", "挑战", "创造", "成长", "帮助",
    "work", "family", "money", "freedom", "stability", "team", "alone", "challenge", "creativity", "growth",
    "helping",
];

/// 倾向词对（正向，负向）；负向词往往包含正向词，所以先判负向
const SENTIMENT_PAIRS: &[(&str, &str)] = &[
    ("喜欢", "不喜欢"),
    ("重要", "不重要"),
    ("擅长", "不擅长"),
    ("想要", "不想"),
    ("享受", "讨厌"),
    ("看重", "不在乎"),
    ("like", "dislike"),
    ("enjoy", "hate"),
    ("important", "unimportant"),
    ("value", "don't care"),
    ("good at", "bad at"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Positive,
    Negative,
}

fn polarity(text: &str, pair: &(&str, &str)) -> Option<Polarity> {
    if text.contains(pair.1) {
        Some(Polarity::Negative)
    } else if text.contains(pair.0) {
        Some(Polarity::Positive)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileNote {
    pub step: String,
    pub analysis: String,
    pub iteration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    pub step: String,
    pub topic: String,
    pub previous: String,
    pub current: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub notes: Vec<ProfileNote>,
    pub contradictions: Vec<Contradiction>,
}

impl Profile {
    /// 追加笔记并与上一条比较；发现矛盾时返回它
    pub fn add_note(&mut self, note: ProfileNote) -> Option<Contradiction> {
        let found = self
            .notes
            .last()
            .and_then(|prev| detect_contradiction(prev, &note));
        if let Some(c) = &found {
            self.contradictions.push(c.clone());
        }
        self.notes.push(note);
        found
    }
}

pub fn detect_contradiction(prev: &ProfileNote, curr: &ProfileNote) -> Option<Contradiction> {
    let a = prev.analysis.to_lowercase();
    let b = curr.analysis.to_lowercase();
    let topic = TOPIC_KEYWORDS
        .iter()
        .find(|t| a.contains(*t) && b.contains(*t))?;
    let flipped = SENTIMENT_PAIRS.iter().any(|pair| {
        matches!(
            (polarity(&a, pair), polarity(&b, pair)),
            (Some(x), Some(y)) if x != y
        )
    });
    flipped.then(|| Contradiction {
        step: curr.step.clone(),
        topic: topic.to_string(),
        previous: prev.analysis.clone(),
        current: curr.analysis.clone(),
    })
}

/// 把新的分析并入滚动摘要，只保留末尾 max_chars 个字符
pub fn fold_summary(previous: Option<&str>, analysis: &str, max_chars: usize) -> String {
    let analysis = analysis.trim();
    let joined = match previous {
        Some(p) if !p.trim().is_empty() => format!("{}\n{}", p.trim_end(), analysis),
        _ => analysis.to_string(),
    };
    let len = joined.chars().count();
    if len <= max_chars {
        return joined;
    }
    joined.chars().skip(len - max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(analysis: &str) -> ProfileNote {
        ProfileNote {
            step: "values_exploration".into(),
            analysis: analysis.into(),
            iteration: 1,
        }
    }

    #[test]
    fn test_contradiction_on_same_topic_flip() {
        let mut p = Profile::default();
        assert!(p.add_note(note("用户很喜欢团队合作")).is_none());
        let c = p.add_note(note("用户其实不喜欢团队里的会议")).unwrap();
        assert_eq!(c.topic, "团队");
        assert_eq!(p.contradictions.len(), 1);
        assert_eq!(p.notes.len(), 2);
    }

    #[test]
    fn test_no_contradiction_without_shared_topic() {
        let prev = note("User likes freedom");
        let curr = note("User dislikes routine work");
        assert!(detect_contradiction(&prev, &curr).is_none());
    }

    #[test]
    fn test_no_contradiction_when_consistent() {
        let prev = note("User enjoys helping people");
        let curr = note("helping others is something they enjoy");
        assert!(detect_contradiction(&prev, &curr).is_none());
    }

    #[test]
    fn test_only_last_note_is_compared() {
        let mut p = Profile::default();
        p.add_note(note("用户喜欢稳定"));
        p.add_note(note("用户提到了家庭"));
        assert!(p.add_note(note("用户不喜欢稳定")).is_none());
    }

    #[test]
    fn test_fold_summary_keeps_tail() {
        assert_eq!(fold_summary(None, " a ", 10), "a");
        assert_eq!(fold_summary(Some("abc"), "def", 10), "abc\ndef");
        assert_eq!(fold_summary(Some("abcdef"), "ghij", 5), "\nghij");
    }
}
