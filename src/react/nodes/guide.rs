//! 引导节点：空闲提醒，生成一句鼓励用户继续的话

use serde_json::json;

use crate::core::state::TurnState;
use crate::core::AgentError;
use crate::memory::Message;
use crate::react::events::{send_event, ReactEvent, StreamSink};
use crate::react::graph::AgentGraph;
use crate::react::prompts;

use super::fail_turn;

impl AgentGraph {
    pub(crate) async fn guide(&self, state: &mut TurnState, sink: Option<&StreamSink>) {
        send_event(sink, ReactEvent::Node { name: "guide".into() });
        let messages = [
            Message::system(prompts::guide_system(state)),
            Message::user(prompts::GUIDE_USER_PROMPT),
        ];
        match self.llm.chat(&messages, self.config.temperatures.guide).await {
            Ok(text) => {
                state.log("生成引导语", json!({ "step": state.current_step }));
                state.finish(text.trim().to_string());
            }
            Err(e) => fail_turn(state, AgentError::ModelInvocation(e), sink),
        }
    }
}
