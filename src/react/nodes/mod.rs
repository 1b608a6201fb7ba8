//! 各节点实现（impl AgentGraph）；每个节点自行捕获错误写入状态，不向外传播

mod action;
mod guide;
mod observation;
mod output;
mod reasoning;

pub use output::{APOLOGY_MESSAGE, MIN_CARD_INPUT_CHARS, NO_REPLY_MESSAGE};

use crate::core::state::TurnState;
use crate::core::AgentError;
use crate::react::events::{send_event, ReactEvent, StreamSink};

/// 推送 error 事件后记录错误并结束循环
fn fail_turn(state: &mut TurnState, err: AgentError, sink: Option<&StreamSink>) {
    send_event(sink, ReactEvent::Error { text: err.to_string() });
    state.fail(err);
}
