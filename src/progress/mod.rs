//! 题目进度：步骤目录、题目状态机、题目目标、充分性判定与答题卡

pub mod card;
pub mod goals;
pub mod question;
pub mod steps;
pub mod tracker;

pub use card::{AnswerCard, CardAnalysis, CardSynthesizer};
pub use goals::{GoalBook, QuestionGoal};
pub use question::{ProgressAction, ProgressMap, QuestionProgress, QuestionStatus, StepProgress};
pub use tracker::{
    detect_skip_intent, should_show_answer_card, ProgressTracker, QuestionBrief, SufficiencyReason,
    Verdict,
};
