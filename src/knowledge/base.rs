//! 知识库：价值观 / 才能 / 兴趣条目与题库
//!
//! 关键词打分检索：名称命中记满分权重，定义、优势、劣势等描述字段降权。

use serde::{Deserialize, Serialize};

use crate::knowledge::loader::{ContentFile, ContentLoader};
use crate::knowledge::tokenizer::{keywords, match_score};
use crate::progress::goals::GoalBook;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueItem {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestItem {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthItem {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub weaknesses: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub id: u32,
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub starred: bool,
}

/// 检索命中
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchHit {
    Value {
        name: String,
        definition: String,
        score: f32,
    },
    Interest {
        name: String,
        score: f32,
    },
    Strength {
        name: String,
        strengths: String,
        weaknesses: String,
        score: f32,
    },
    Question {
        id: u32,
        category: String,
        content: String,
        score: f32,
    },
}

impl SearchHit {
    pub fn score(&self) -> f32 {
        match self {
            SearchHit::Value { score, .. }
            | SearchHit::Interest { score, .. }
            | SearchHit::Strength { score, .. }
            | SearchHit::Question { score, .. } => *score,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SearchHit::Value { name, .. }
            | SearchHit::Interest { name, .. }
            | SearchHit::Strength { name, .. } => name,
            SearchHit::Question { content, .. } => content,
        }
    }
}

/// 名称被查询整体包含时直接记满分（如「我很看重诚实」命中「诚实」）
fn name_score(name: &str, query_lower: &str, kws: &[String]) -> f32 {
    let name_lower = name.trim().to_lowercase();
    if !name_lower.is_empty() && query_lower.contains(&name_lower) {
        return 1.0;
    }
    match_score(name, kws)
}

fn sort_and_cut(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| b.score().total_cmp(&a.score()));
    hits.truncate(limit);
    hits
}

/// 内存知识库
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    content: ContentFile,
}

impl KnowledgeBase {
    pub fn new(content: ContentFile) -> Self {
        Self { content }
    }

    pub fn values(&self) -> &[ValueItem] {
        &self.content.values
    }

    pub fn interests(&self) -> &[InterestItem] {
        &self.content.interests
    }

    pub fn strengths(&self) -> &[StrengthItem] {
        &self.content.strengths
    }

    pub fn all_questions(&self) -> &[QuestionItem] {
        &self.content.questions
    }

    pub fn goal_book(&self) -> GoalBook {
        GoalBook::from_entries(self.content.goals.clone())
    }

    pub fn search_values(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let kws = keywords(query);
        let q = query.to_lowercase();
        let hits = self
            .content
            .values
            .iter()
            .filter_map(|v| {
                let score = name_score(&v.name, &q, &kws).max(match_score(&v.definition, &kws) * 0.5);
                (score > 0.0).then(|| SearchHit::Value {
                    name: v.name.clone(),
                    definition: v.definition.clone(),
                    score,
                })
            })
            .collect();
        sort_and_cut(hits, limit)
    }

    pub fn search_interests(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let kws = keywords(query);
        let q = query.to_lowercase();
        let hits = self
            .content
            .interests
            .iter()
            .filter_map(|i| {
                let score = name_score(&i.name, &q, &kws);
                (score > 0.0).then(|| SearchHit::Interest { name: i.name.clone(), score })
            })
            .collect();
        sort_and_cut(hits, limit)
    }

    pub fn search_strengths(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let kws = keywords(query);
        let q = query.to_lowercase();
        let hits = self
            .content
            .strengths
            .iter()
            .filter_map(|s| {
                let score = name_score(&s.name, &q, &kws)
                    .max(match_score(&s.strengths, &kws) * 0.5)
                    .max(match_score(&s.weaknesses, &kws) * 0.3);
                (score > 0.0).then(|| SearchHit::Strength {
                    name: s.name.clone(),
                    strengths: s.strengths.clone(),
                    weaknesses: s.weaknesses.clone(),
                    score,
                })
            })
            .collect();
        sort_and_cut(hits, limit)
    }

    pub fn search_questions(&self, query: &str, category: Option<&str>, limit: usize) -> Vec<SearchHit> {
        let kws = keywords(query);
        let hits = self
            .content
            .questions
            .iter()
            .filter(|q| category.map(|c| q.category == c).unwrap_or(true))
            .filter_map(|q| {
                let score = match_score(&q.content, &kws);
                (score > 0.0).then(|| SearchHit::Question {
                    id: q.id,
                    category: q.category.clone(),
                    content: q.content.clone(),
                    score,
                })
            })
            .collect();
        sort_and_cut(hits, limit)
    }

    /// 按类别检索；category 为 None 时合并三类
    pub fn search(&self, query: &str, category: Option<&str>, per_category: usize, limit: usize) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        match category {
            Some("questions") => hits.extend(self.search_questions(query, None, limit)),
            Some("values") => hits.extend(self.search_values(query, per_category)),
            Some("interests") => hits.extend(self.search_interests(query, per_category)),
            Some("strengths") => hits.extend(self.search_strengths(query, per_category)),
            _ => {
                hits.extend(self.search_values(query, per_category));
                hits.extend(self.search_interests(query, per_category));
                hits.extend(self.search_strengths(query, per_category));
            }
        }
        sort_and_cut(hits, limit)
    }

    /// 引导题：优先星标题，不足时取前 n 道
    pub fn guided_questions(&self, category: &str, n: usize) -> Vec<QuestionItem> {
        let in_category: Vec<&QuestionItem> = self
            .content
            .questions
            .iter()
            .filter(|q| q.category == category)
            .collect();
        let starred: Vec<QuestionItem> = in_category
            .iter()
            .filter(|q| q.starred)
            .take(n)
            .map(|q| (*q).clone())
            .collect();
        if !starred.is_empty() {
            return starred;
        }
        in_category.into_iter().take(n).cloned().collect()
    }
}

impl ContentLoader for KnowledgeBase {
    fn questions(&self, category: &str) -> Vec<QuestionItem> {
        self.content
            .questions
            .iter()
            .filter(|q| q.category == category)
            .cloned()
            .collect()
    }
}
