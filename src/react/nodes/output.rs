//! 输出节点：本轮唯一写入用户可见消息的地方，并决定是否附带答题卡

use serde_json::json;

use crate::core::state::TurnState;
use crate::memory::Message;
use crate::progress::steps::is_interview_step;
use crate::progress::AnswerCard;
use crate::react::events::{send_event, ReactEvent, StreamSink};
use crate::react::graph::AgentGraph;

pub const APOLOGY_MESSAGE: &str = "抱歉，处理时遇到了一点问题，请稍后再试一次。";
pub const NO_REPLY_MESSAGE: &str = "抱歉，我暂时无法给出回复，请再试一次。";
/// 基础答题卡要求的最少输入字符数
pub const MIN_CARD_INPUT_CHARS: usize = 20;

fn basic_card(state: &TurnState, analysis: &str) -> AnswerCard {
    let current = state
        .question_progress
        .get(&state.current_step)
        .and_then(|s| s.current_question());
    AnswerCard {
        question_step: state.current_step.clone(),
        question_id: current.map(|q| q.question_id),
        question_content: current.map(|q| q.content.clone()),
        user_answer: state.user_input.trim().to_string(),
        ai_summary: String::new(),
        ai_analysis: analysis.to_string(),
        key_insights: Vec::new(),
        should_show: false,
    }
}

impl AgentGraph {
    pub(crate) fn output(&self, state: &mut TurnState, sink: Option<&StreamSink>) {
        send_event(sink, ReactEvent::Node { name: "output".into() });

        let response = state
            .final_response
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from);
        let content = match (&state.error, &response) {
            (Some(_), _) => APOLOGY_MESSAGE.to_string(),
            (None, Some(r)) => r.clone(),
            (None, None) => NO_REPLY_MESSAGE.to_string(),
        };

        if state.answer_card.is_none() && state.error.is_none() && !state.should_continue {
            if let Some(r) = &response {
                let long_enough = state.user_input.trim().chars().count() >= MIN_CARD_INPUT_CHARS;
                if long_enough && is_interview_step(&state.current_step) {
                    state.answer_card = Some(basic_card(state, r));
                }
            }
        }

        state.messages.push(Message::assistant(content.clone()));
        send_event(sink, ReactEvent::Reply { text: content.clone() });
        send_event(sink, ReactEvent::MessageDone);
        state.log_done(
            "已向用户输出回复",
            json!({
                "length": content.chars().count(),
                "answer_card": state.answer_card.is_some(),
                "error": state.error.is_some(),
            }),
        );
    }
}
