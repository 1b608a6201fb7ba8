//! 内容加载：题库、知识条目与题目目标
//!
//! 内容文件为 TOML（见 config/content.toml）；步骤初始化时通过 ContentLoader 读取一次题目。

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::core::AgentError;
use crate::knowledge::base::{InterestItem, QuestionItem, StrengthItem, ValueItem};
use crate::progress::goals::GoalEntry;

/// 按类别提供题目
pub trait ContentLoader: Send + Sync {
    fn questions(&self, category: &str) -> Vec<QuestionItem>;
}

/// 内容文件结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentFile {
    #[serde(default)]
    pub values: Vec<ValueItem>,
    #[serde(default)]
    pub interests: Vec<InterestItem>,
    #[serde(default)]
    pub strengths: Vec<StrengthItem>,
    #[serde(default)]
    pub questions: Vec<QuestionItem>,
    #[serde(default)]
    pub goals: Vec<GoalEntry>,
}

impl ContentFile {
    pub fn parse(text: &str) -> Result<Self, AgentError> {
        toml::from_str(text).map_err(|e| AgentError::Content(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, AgentError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AgentError::Content(format!("{}: {}", path.display(), e)))?;
        let content = Self::parse(&text)?;
        tracing::info!(
            path = %path.display(),
            values = content.values.len(),
            interests = content.interests.len(),
            strengths = content.strengths.len(),
            questions = content.questions.len(),
            "content loaded"
        );
        Ok(content)
    }
}

/// 内存题库（测试与嵌入场景）
#[derive(Debug, Clone, Default)]
pub struct StaticContentLoader {
    questions: HashMap<String, Vec<QuestionItem>>,
}

impl StaticContentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_questions(category: &str, contents: &[&str]) -> Self {
        Self::new().add_category(category, contents)
    }

    pub fn add_category(mut self, category: &str, contents: &[&str]) -> Self {
        let items = contents
            .iter()
            .enumerate()
            .map(|(i, c)| QuestionItem {
                id: i as u32 + 1,
                category: category.to_string(),
                content: c.to_string(),
                starred: false,
            })
            .collect();
        self.questions.insert(category.to_string(), items);
        self
    }
}

impl ContentLoader for StaticContentLoader {
    fn questions(&self, category: &str) -> Vec<QuestionItem> {
        self.questions.get(category).cloned().unwrap_or_default()
    }
}
