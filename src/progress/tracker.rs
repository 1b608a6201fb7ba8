//! 题目进度追踪器
//!
//! 每轮推理开始前准备题目流程：步骤初始化、介绍展示、跳过检测、计轮、回答充分性判定与答题卡合成。
//! 充分性判定是纯函数，按固定顺序逐条检查。

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::core::state::TurnState;
use crate::knowledge::ContentLoader;
use crate::memory::Message;
use crate::progress::card::{extract_user_answer, AnswerCard, CardSynthesizer};
use crate::progress::goals::{GoalBook, QuestionGoal, SKIP_KEYWORDS, SKIP_MAX_CHARS};
use crate::progress::question::{
    ProgressAction, QuestionProgress, QuestionStatus, StepProgress,
};
use crate::progress::steps::{
    category_for_step, category_label, next_step, question_guidance, render_step_intro,
};

/// 回答过短的阈值（字符数）
pub const MIN_ANSWER_CHARS: usize = 30;
/// 充分性判定只看最近几条对话
pub const RECENT_WINDOW: usize = 4;

/// 短句中出现跳过关键词即视为跳过
pub fn detect_skip_intent(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > SKIP_MAX_CHARS {
        return false;
    }
    let lower = trimmed.to_lowercase();
    SKIP_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SufficiencyReason {
    NoCurrentQuestion,
    RegenerateRequested,
    NotEnoughTurns,
    AnswerTooShort,
    TurnLimitReached,
    NoRecentAnswer,
    AnswerSufficient,
    NeedsMoreDepth,
}

impl SufficiencyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SufficiencyReason::NoCurrentQuestion => "no current question",
            SufficiencyReason::RegenerateRequested => "regenerate requested",
            SufficiencyReason::NotEnoughTurns => "not enough turns",
            SufficiencyReason::AnswerTooShort => "answer too short",
            SufficiencyReason::TurnLimitReached => "turn limit reached",
            SufficiencyReason::NoRecentAnswer => "no recent user answer",
            SufficiencyReason::AnswerSufficient => "answer sufficient",
            SufficiencyReason::NeedsMoreDepth => "needs more depth",
        }
    }
}

impl fmt::Display for SufficiencyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 充分性判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub sufficient: bool,
    pub reason: SufficiencyReason,
}

impl Verdict {
    fn yes(reason: SufficiencyReason) -> Self {
        Self { sufficient: true, reason }
    }

    fn no(reason: SufficiencyReason) -> Self {
        Self { sufficient: false, reason }
    }

    pub fn as_tuple(&self) -> (bool, &'static str) {
        (self.sufficient, self.reason.as_str())
    }
}

/// 最近窗口内最后一条用户发言
fn latest_user_answer(transcript: &[Message]) -> Option<&str> {
    let start = transcript.len().saturating_sub(RECENT_WINDOW);
    transcript[start..]
        .iter()
        .rev()
        .find(|m| m.is_user())
        .map(|m| m.content.trim())
}

/// 是否应展示答题卡
///
/// 顺序：强制重新生成 → 轮数不足 → 轮数上限 → 最近回答检查（无回答 / 过短 / 含提示词且超过下限）。
/// 轮数不足时如果最近回答同时过短，原因报告为 answer too short，其余为 not enough turns；
/// 两者结论都是不展示。
pub fn should_show_answer_card(
    question: Option<&QuestionProgress>,
    goal: &QuestionGoal,
    transcript: &[Message],
    force_regenerate: bool,
) -> Verdict {
    let Some(question) = question else {
        return Verdict::no(SufficiencyReason::NoCurrentQuestion);
    };
    let turns = question.turn_count;
    let latest = latest_user_answer(transcript);
    let too_short = |a: &str| a.chars().count() < MIN_ANSWER_CHARS;

    if force_regenerate && turns > 0 {
        return Verdict::yes(SufficiencyReason::RegenerateRequested);
    }
    if turns < goal.min_turns {
        return match latest {
            Some(a) if too_short(a) => Verdict::no(SufficiencyReason::AnswerTooShort),
            _ => Verdict::no(SufficiencyReason::NotEnoughTurns),
        };
    }
    if turns >= goal.max_turns {
        return Verdict::yes(SufficiencyReason::TurnLimitReached);
    }
    let Some(answer) = latest else {
        return Verdict::no(SufficiencyReason::NoRecentAnswer);
    };
    if too_short(answer) {
        return Verdict::no(SufficiencyReason::AnswerTooShort);
    }
    let lower = answer.to_lowercase();
    let has_hint = goal.hints.iter().any(|h| lower.contains(&h.to_lowercase()));
    if has_hint && turns >= goal.min_turns + 1 {
        Verdict::yes(SufficiencyReason::AnswerSufficient)
    } else {
        Verdict::no(SufficiencyReason::NeedsMoreDepth)
    }
}

/// 本轮题目流程摘要，拼入推理提示词
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionBrief {
    pub category: String,
    pub step_intro: Option<String>,
    pub guidance: Option<String>,
    pub current_question: Option<String>,
    pub question_number: Option<usize>,
    pub total_questions: usize,
    pub turn_count: u32,
    pub verdict: Option<Verdict>,
    pub completed_question: Option<String>,
    pub skipped_question: Option<String>,
    pub step_completed: bool,
    pub next_step: Option<String>,
}

impl QuestionBrief {
    pub fn render(&self) -> String {
        let mut lines = vec![format!("当前探索类别：{}", category_label(&self.category))];
        if let Some(intro) = &self.step_intro {
            lines.push(format!("本步骤第一次开始，请先用一两句话介绍：\n{}", intro));
        }
        if let Some(q) = &self.completed_question {
            lines.push(format!("题目「{}」已回答充分并生成答题卡，请简短肯定用户并自然过渡。", q));
        }
        if let Some(q) = &self.skipped_question {
            lines.push(format!("用户选择跳过题目「{}」，不要追问，直接进入下一题。", q));
        }
        if self.step_completed {
            lines.push("本步骤所有题目已完成，请帮助用户回顾本步骤的收获。".to_string());
            if let Some(next) = &self.next_step {
                lines.push(format!("下一个步骤：{}", next));
            }
        } else if let Some(q) = &self.current_question {
            let number = self.question_number.unwrap_or(0);
            lines.push(format!("当前题目（第 {}/{} 题）：{}", number, self.total_questions, q));
            if let Some(g) = &self.guidance {
                lines.push(format!("这是新题目，请用引导语开场：{}", g));
            } else {
                lines.push(format!("本题已对话 {} 轮", self.turn_count));
            }
        }
        if let Some(v) = &self.verdict {
            if !v.sufficient {
                lines.push(format!("回答充分性：{}，请继续温和追问。", v.reason));
            }
        }
        lines.join("\n")
    }
}

/// 题目进度追踪器：持有内容加载器、题目目标表与答题卡合成器
pub struct ProgressTracker {
    loader: Arc<dyn ContentLoader>,
    goals: GoalBook,
    cards: CardSynthesizer,
}

impl ProgressTracker {
    pub fn new(loader: Arc<dyn ContentLoader>, goals: GoalBook, cards: CardSynthesizer) -> Self {
        Self { loader, goals, cards }
    }

    pub fn goal(&self, category: &str, question_id: u32) -> QuestionGoal {
        self.goals.get(category, question_id)
    }

    /// 从题库初始化步骤进度；非访谈步骤返回 None
    pub fn init_step(&self, step_id: &str) -> Option<StepProgress> {
        let category = category_for_step(step_id)?;
        let questions = self
            .loader
            .questions(category)
            .into_iter()
            .map(|q| QuestionProgress::new(q.id, q.content))
            .collect();
        Some(StepProgress::new(step_id, category, questions))
    }

    /// 对当前题目做充分性判定
    pub fn judge(&self, step: &StepProgress, transcript: &[Message], force: bool) -> Verdict {
        let question = step.current_question();
        let goal = question
            .map(|q| self.goals.get(&step.category, q.question_id))
            .unwrap_or_else(|| crate::progress::goals::default_goal(&step.category));
        should_show_answer_card(question, &goal, transcript, force)
    }

    /// 准备本轮题目流程，写回 state.question_progress / answer_card / context.question_brief
    pub async fn prepare_turn(&self, state: &mut TurnState) -> Option<QuestionBrief> {
        let step_id = state.current_step.clone();
        let category = category_for_step(&step_id)?;
        let mut step = match state.question_progress.get(&step_id) {
            Some(existing) => {
                let mut s = existing.clone();
                s.normalize();
                s
            }
            None => {
                let s = self.init_step(&step_id)?;
                state.log(
                    "已初始化步骤进度",
                    serde_json::json!({ "step": step_id, "questions": s.questions.len() }),
                );
                s
            }
        };

        let mut brief = QuestionBrief {
            category: category.to_string(),
            ..Default::default()
        };

        if !step.is_intro_shown {
            brief.step_intro = Some(render_step_intro(&step_id));
            step.apply(ProgressAction::MarkIntroShown);
            state.log("展示步骤介绍", serde_json::json!({ "step": step_id }));
        }

        let mut advanced = false;
        if let Some(question) = step.current_question().cloned() {
            if detect_skip_intent(&state.user_input) {
                // 跳过的那句不算回答
                let earlier = &state.messages[..state.messages.len().saturating_sub(1)];
                let answer = Some(extract_user_answer(earlier)).filter(|a| !a.is_empty());
                step.apply(ProgressAction::CompleteQuestion { answer });
                step.apply(ProgressAction::NextQuestion);
                brief.skipped_question = Some(question.content.clone());
                advanced = true;
                state.log(
                    "用户跳过题目",
                    serde_json::json!({ "question_id": question.question_id }),
                );
            } else if question.status == QuestionStatus::NotStarted {
                step.apply(ProgressAction::StartQuestion);
                brief.guidance = Some(question_guidance(category).to_string());
                state.log(
                    "开始新题目",
                    serde_json::json!({ "question_id": question.question_id }),
                );
            } else {
                step.apply(ProgressAction::IncrementTurn);
                let verdict = self.judge(&step, &state.messages, state.force_regenerate_card);
                brief.turn_count = step.current_question().map(|q| q.turn_count).unwrap_or(0);
                brief.verdict = Some(verdict);
                state.log(
                    "回答充分性判定",
                    serde_json::json!({
                        "question_id": question.question_id,
                        "turn_count": brief.turn_count,
                        "sufficient": verdict.sufficient,
                        "reason": verdict.reason.as_str(),
                    }),
                );
                if verdict.sufficient {
                    let goal = self.goals.get(category, question.question_id);
                    let analysis = self
                        .cards
                        .synthesize(category, &question.content, &goal, &state.messages)
                        .await;
                    let answer = extract_user_answer(&state.messages);
                    state.answer_card = Some(AnswerCard {
                        question_step: step_id.clone(),
                        question_id: Some(question.question_id),
                        question_content: Some(question.content.clone()),
                        user_answer: answer.clone(),
                        ai_summary: analysis.ai_summary,
                        ai_analysis: analysis.ai_analysis,
                        key_insights: analysis.key_insights,
                        should_show: true,
                    });
                    step.apply(ProgressAction::CompleteQuestion { answer: Some(answer) });
                    step.apply(ProgressAction::NextQuestion);
                    brief.completed_question = Some(question.content.clone());
                    advanced = true;
                    state.log(
                        "题目完成，已生成答题卡",
                        serde_json::json!({ "question_id": question.question_id }),
                    );
                }
            }
        }

        if advanced {
            if let Some(next) = step.current_question().map(|q| q.question_id) {
                step.apply(ProgressAction::StartQuestion);
                brief.guidance = Some(question_guidance(category).to_string());
                state.log("进入下一题", serde_json::json!({ "question_id": next }));
            }
        }

        brief.total_questions = step.questions.len();
        brief.current_question = step.current_question().map(|q| q.content.clone());
        brief.question_number = step
            .current_question()
            .map(|_| step.current_question_index + 1);
        brief.step_completed = step.is_completed();
        if brief.step_completed {
            brief.next_step = next_step(&step_id).map(String::from);
        }

        state.question_progress.insert(step_id, step);
        state.context.question_brief = Some(brief.clone());
        Some(brief)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::TurnRequest;
    use crate::knowledge::StaticContentLoader;
    use crate::llm::ScriptedLlmClient;
    use crate::progress::goals::default_goal;

    fn question(turns: u32) -> QuestionProgress {
        let mut q = QuestionProgress::new(1, "什么对你最重要？");
        q.start();
        q.turn_count = turns;
        q
    }

    fn transcript(answer: &str) -> Vec<Message> {
        vec![Message::assistant("什么对你最重要？"), Message::user(answer)]
    }

    const LONG_HINT: &str = "I feel most alive when I help my friends solve hard problems because it matters to me";

    #[test]
    fn test_skip_intent() {
        assert!(detect_skip_intent("next question"));
        assert!(detect_skip_intent("  跳过  "));
        assert!(detect_skip_intent("Skip"));
        let long = "I would never skip helping someone who needs it badly";
        assert!(long.chars().count() > 15);
        assert!(!detect_skip_intent(long));
        assert!(!detect_skip_intent(""));
    }

    #[test]
    fn test_short_answer_on_first_turn() {
        let v = should_show_answer_card(
            Some(&question(0)),
            &default_goal("values"),
            &transcript("I like helping"),
            false,
        );
        assert_eq!(v.as_tuple(), (false, "answer too short"));
    }

    #[test]
    fn test_sufficient_after_three_turns_with_hint() {
        let v = should_show_answer_card(
            Some(&question(3)),
            &default_goal("values"),
            &transcript(LONG_HINT),
            false,
        );
        assert_eq!(v.as_tuple(), (true, "answer sufficient"));
    }

    #[test]
    fn test_min_turn_boundary_needs_one_more_turn_for_hint() {
        let v = should_show_answer_card(
            Some(&question(2)),
            &default_goal("values"),
            &transcript(LONG_HINT),
            false,
        );
        assert_eq!(v.reason, SufficiencyReason::NeedsMoreDepth);
    }

    #[test]
    fn test_below_min_never_sufficient_and_at_max_always() {
        let goal = default_goal("values");
        for answer in ["", "ok", LONG_HINT] {
            for turns in 0..goal.min_turns {
                let v = should_show_answer_card(Some(&question(turns)), &goal, &transcript(answer), false);
                assert!(!v.sufficient);
            }
            for turns in goal.max_turns..goal.max_turns + 3 {
                let v = should_show_answer_card(Some(&question(turns)), &goal, &transcript(answer), false);
                assert!(v.sufficient);
                assert_eq!(v.reason, SufficiencyReason::TurnLimitReached);
            }
        }
    }

    #[test]
    fn test_long_answer_below_min_reports_turns() {
        let v = should_show_answer_card(
            Some(&question(1)),
            &default_goal("values"),
            &transcript(LONG_HINT),
            false,
        );
        assert_eq!(v.reason, SufficiencyReason::NotEnoughTurns);
    }

    #[test]
    fn test_force_regenerate_needs_a_turn() {
        let goal = default_goal("values");
        let v = should_show_answer_card(Some(&question(1)), &goal, &transcript("ok"), true);
        assert_eq!(v.as_tuple(), (true, "regenerate requested"));
        let v = should_show_answer_card(Some(&question(0)), &goal, &transcript("ok"), true);
        assert!(!v.sufficient);
    }

    #[test]
    fn test_no_recent_user_message() {
        let msgs = vec![
            Message::user(LONG_HINT),
            Message::assistant("a"),
            Message::assistant("b"),
            Message::assistant("c"),
            Message::assistant("d"),
        ];
        let v = should_show_answer_card(Some(&question(3)), &default_goal("values"), &msgs, false);
        assert_eq!(v.reason, SufficiencyReason::NoRecentAnswer);
    }

    #[test]
    fn test_no_current_question() {
        let v = should_show_answer_card(None, &default_goal("values"), &[], true);
        assert_eq!(v.as_tuple(), (false, "no current question"));
    }

    fn tracker(llm: Arc<ScriptedLlmClient>) -> ProgressTracker {
        let loader = Arc::new(StaticContentLoader::with_questions(
            "values",
            &["什么对你最重要？", "你最敬佩谁？"],
        ));
        ProgressTracker::new(loader, GoalBook::new(), CardSynthesizer::new(llm))
    }

    fn state(input: &str) -> TurnState {
        TurnState::new(TurnRequest::new("s1", input, "values_exploration"))
    }

    #[tokio::test]
    async fn test_first_turn_shows_intro_and_starts_question() {
        let t = tracker(Arc::new(ScriptedLlmClient::new(Vec::<String>::new())));
        let mut st = state("你好");
        let brief = t.prepare_turn(&mut st).await.unwrap();
        assert!(brief.step_intro.is_some());
        assert!(brief.guidance.is_some());
        assert_eq!(brief.question_number, Some(1));
        let step = &st.question_progress["values_exploration"];
        assert!(step.is_intro_shown);
        assert_eq!(step.questions[0].status, QuestionStatus::InProgress);
        assert_eq!(step.questions[0].turn_count, 0);
    }

    #[tokio::test]
    async fn test_skip_advances_to_next_question() {
        let t = tracker(Arc::new(ScriptedLlmClient::new(Vec::<String>::new())));
        let mut st = state("你好");
        t.prepare_turn(&mut st).await;
        let progress = st.question_progress.clone();

        let mut st = state("跳过");
        st.question_progress = progress;
        let brief = t.prepare_turn(&mut st).await.unwrap();
        assert_eq!(brief.skipped_question.as_deref(), Some("什么对你最重要？"));
        assert_eq!(brief.current_question.as_deref(), Some("你最敬佩谁？"));
        assert!(brief.step_intro.is_none());
        let step = &st.question_progress["values_exploration"];
        assert_eq!(step.current_question_index, 1);
        assert!(step.questions[0].is_completed());
        assert_eq!(step.questions[1].status, QuestionStatus::InProgress);
        assert!(st.answer_card.is_none());
    }

    #[tokio::test]
    async fn test_turn_cap_completes_with_card() {
        let llm = Arc::new(ScriptedLlmClient::new([
            r#"{"ai_summary":"重视家人","ai_analysis":"...","key_insights":["家庭"]}"#,
        ]));
        let t = tracker(llm);
        let mut st = state("还是家人吧");
        let mut step = t.init_step("values_exploration").unwrap();
        step.is_intro_shown = true;
        step.questions[0].start();
        step.questions[0].turn_count = 4;
        st.question_progress.insert("values_exploration".into(), step);

        let brief = t.prepare_turn(&mut st).await.unwrap();
        assert_eq!(brief.completed_question.as_deref(), Some("什么对你最重要？"));
        let card = st.answer_card.as_ref().unwrap();
        assert!(card.should_show);
        assert_eq!(card.ai_summary, "重视家人");
        assert_eq!(card.user_answer, "还是家人吧");
        let step = &st.question_progress["values_exploration"];
        assert_eq!(step.questions[0].user_answer.as_deref(), Some("还是家人吧"));
        assert_eq!(step.current_question_index, 1);
    }

    #[tokio::test]
    async fn test_non_interview_step_has_no_progress() {
        let t = tracker(Arc::new(ScriptedLlmClient::new(Vec::<String>::new())));
        let mut st = TurnState::new(TurnRequest::new("s1", "hi", "combination"));
        assert!(t.prepare_turn(&mut st).await.is_none());
        assert!(st.question_progress.is_empty());
    }
}
