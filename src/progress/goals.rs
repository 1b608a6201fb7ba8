//! 题目目标：每道题的最少 / 最多对话轮数与「回答充分」提示词
//!
//! 题目级目标来自内容文件，缺省时回落到类别默认值。

use std::collections::HashMap;

use serde::Deserialize;

/// 跳过意图关键词（中英文）
pub const SKIP_KEYWORDS: &[&str] = &[
    "下一题",
    "跳过",
    "不想回答",
    "换一题",
    "下一个",
    "不想说",
    "不知道怎么回答",
    "算了",
    "next question",
    "skip",
    "don't know",
    "dont know",
    "move on",
];

/// 跳过意图只在短句中生效
pub const SKIP_MAX_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionGoal {
    pub goal: String,
    pub min_turns: u32,
    pub max_turns: u32,
    pub hints: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

const GENERAL_HINTS: &[&str] = &[
    "因为", "比如", "例如", "感觉", "觉得", "体验", "经历", "让我", "的时候",
    "because", "for example", "for instance", "feel", "experience", "when i",
];

/// 类别默认目标
pub fn default_goal(category: &str) -> QuestionGoal {
    match category {
        "strengths" => QuestionGoal {
            goal: "挖掘用户擅长且做起来轻松自然的事情，以及别人给过的反馈".into(),
            min_turns: 2,
            max_turns: 5,
            hints: words(&[
                "擅长", "轻松", "自然", "比如", "经历", "别人说", "反馈",
                "good at", "easy", "naturally", "for example", "people say",
            ]),
        },
        "interests" => QuestionGoal {
            goal: "找到让用户投入、满足、愿意长期坚持的事物".into(),
            min_turns: 2,
            max_turns: 4,
            hints: words(&[
                "喜欢", "兴趣", "投入", "满足", "开心", "享受", "好奇",
                "enjoy", "love", "curious", "excited", "because",
            ]),
        },
        "values" => QuestionGoal {
            goal: "理解用户做选择时真正看重什么，以及背后的原因".into(),
            min_turns: 2,
            max_turns: 5,
            hints: words(GENERAL_HINTS),
        },
        _ => QuestionGoal {
            goal: "理解用户的真实想法".into(),
            min_turns: 2,
            max_turns: 5,
            hints: words(GENERAL_HINTS),
        },
    }
}

/// 内容文件中的题目级目标（字段缺省时使用类别默认值）
#[derive(Debug, Clone, Deserialize)]
pub struct GoalEntry {
    pub category: String,
    pub question_id: u32,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub min_turns: Option<u32>,
    #[serde(default)]
    pub max_turns: Option<u32>,
    #[serde(default)]
    pub hints: Option<Vec<String>>,
}

/// 题目目标表
#[derive(Debug, Clone, Default)]
pub struct GoalBook {
    overrides: HashMap<(String, u32), QuestionGoal>,
}

impl GoalBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = GoalEntry>) -> Self {
        let mut book = Self::new();
        for e in entries {
            let base = default_goal(&e.category);
            let min_turns = e.min_turns.unwrap_or(base.min_turns);
            let goal = QuestionGoal {
                goal: e.goal.unwrap_or(base.goal),
                min_turns,
                // 上限不能低于下限
                max_turns: e.max_turns.unwrap_or(base.max_turns).max(min_turns),
                hints: e.hints.unwrap_or(base.hints),
            };
            book.overrides.insert((e.category, e.question_id), goal);
        }
        book
    }

    pub fn get(&self, category: &str, question_id: u32) -> QuestionGoal {
        self.overrides
            .get(&(category.to_string(), question_id))
            .cloned()
            .unwrap_or_else(|| default_goal(category))
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_defaults() {
        assert_eq!(default_goal("values").min_turns, 2);
        assert_eq!(default_goal("values").max_turns, 5);
        assert_eq!(default_goal("interests").max_turns, 4);
        assert!(default_goal("strengths").hints.contains(&"擅长".to_string()));
    }

    #[test]
    fn test_goal_book_override_and_fallback() {
        let book = GoalBook::from_entries(vec![GoalEntry {
            category: "values".into(),
            question_id: 3,
            goal: None,
            min_turns: Some(3),
            max_turns: Some(1),
            hints: None,
        }]);
        let g = book.get("values", 3);
        assert_eq!(g.min_turns, 3);
        assert_eq!(g.max_turns, 3);
        assert_eq!(book.get("values", 4), default_goal("values"));
    }
}
