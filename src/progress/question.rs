//! 题目与步骤进度
//!
//! 题目状态机：not_started → in_progress → completed（终态）。
//! 步骤进度由调用方持久化（serde JSON），只由追踪器修改。
//! current_question_index 要么指向有效题目，要么等于题目数，表示全部完成。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 按步骤 id 索引的进度快照
pub type ProgressMap = BTreeMap<String, StepProgress>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// 单道题的进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionProgress {
    pub question_id: u32,
    pub content: String,
    #[serde(default)]
    pub status: QuestionStatus,
    #[serde(default)]
    pub turn_count: u32,
    #[serde(default)]
    pub user_answer: Option<String>,
}

impl QuestionProgress {
    pub fn new(question_id: u32, content: impl Into<String>) -> Self {
        Self {
            question_id,
            content: content.into(),
            status: QuestionStatus::NotStarted,
            turn_count: 0,
            user_answer: None,
        }
    }

    /// not_started → in_progress；其他状态不变
    pub fn start(&mut self) {
        if self.status == QuestionStatus::NotStarted {
            self.status = QuestionStatus::InProgress;
        }
    }

    /// 只有进行中的题目计轮
    pub fn increment_turn(&mut self) {
        if self.status == QuestionStatus::InProgress {
            self.turn_count += 1;
        }
    }

    pub fn complete(&mut self, answer: Option<String>) {
        self.status = QuestionStatus::Completed;
        if answer.is_some() {
            self.user_answer = answer;
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == QuestionStatus::Completed
    }
}

/// 对步骤进度的一次修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressAction {
    MarkIntroShown,
    StartQuestion,
    IncrementTurn,
    CompleteQuestion { answer: Option<String> },
    NextQuestion,
}

/// 单个步骤的进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepProgress {
    pub step_id: String,
    pub category: String,
    pub questions: Vec<QuestionProgress>,
    #[serde(default)]
    pub current_question_index: usize,
    #[serde(default)]
    pub is_intro_shown: bool,
}

impl StepProgress {
    pub fn new(
        step_id: impl Into<String>,
        category: impl Into<String>,
        questions: Vec<QuestionProgress>,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            category: category.into(),
            questions,
            current_question_index: 0,
            is_intro_shown: false,
        }
    }

    pub fn current_question(&self) -> Option<&QuestionProgress> {
        self.questions.get(self.current_question_index)
    }

    pub fn current_question_mut(&mut self) -> Option<&mut QuestionProgress> {
        self.questions.get_mut(self.current_question_index)
    }

    /// 前进到下一道未完成的题；没有则索引停在末尾（== 题目数）。返回是否还有当前题
    pub fn advance(&mut self) -> bool {
        let len = self.questions.len();
        let mut idx = (self.current_question_index + 1).min(len);
        while idx < len && self.questions[idx].is_completed() {
            idx += 1;
        }
        self.current_question_index = idx;
        idx < len
    }

    pub fn is_completed(&self) -> bool {
        self.questions.iter().all(QuestionProgress::is_completed)
    }

    pub fn completed_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_completed()).count()
    }

    /// 外部快照可能被篡改或来自旧版本：把越界索引收回到「全部完成」位置
    pub fn normalize(&mut self) {
        if self.current_question_index > self.questions.len() {
            self.current_question_index = self.questions.len();
        }
    }

    pub fn apply(&mut self, action: ProgressAction) {
        match action {
            ProgressAction::MarkIntroShown => self.is_intro_shown = true,
            ProgressAction::StartQuestion => {
                if let Some(q) = self.current_question_mut() {
                    q.start();
                }
            }
            ProgressAction::IncrementTurn => {
                if let Some(q) = self.current_question_mut() {
                    q.increment_turn();
                }
            }
            ProgressAction::CompleteQuestion { answer } => {
                if let Some(q) = self.current_question_mut() {
                    q.complete(answer);
                }
            }
            ProgressAction::NextQuestion => {
                self.advance();
            }
        }
    }
}
