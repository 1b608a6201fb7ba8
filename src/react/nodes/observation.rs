//! 观察节点：分析本轮工具结果，更新步骤摘要、画像笔记与轮数计数，决定是否继续

use serde_json::json;

use crate::core::state::TurnState;
use crate::core::AgentError;
use crate::memory::Message;
use crate::react::decision::ObservationDecision;
use crate::react::events::{preview, send_event, ReactEvent, StreamSink};
use crate::react::graph::AgentGraph;
use crate::react::profile::{fold_summary, ProfileNote};
use crate::react::prompts;

use super::fail_turn;

const TRACE_OUTPUT_CHARS: usize = 1500;

impl AgentGraph {
    pub(crate) async fn observation(&self, state: &mut TurnState, sink: Option<&StreamSink>) {
        send_event(sink, ReactEvent::Node { name: "observation".into() });

        // 本轮没有调用工具：回复已由行动节点写好
        let Some(result) = state.context.pending_tool_result.take() else {
            state.should_continue = false;
            return;
        };

        let messages = [
            Message::system(prompts::OBSERVATION_SYSTEM),
            Message::user(prompts::observation_prompt(state, &result)),
        ];
        let raw = match self
            .llm
            .chat(&messages, self.config.temperatures.observation)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                fail_turn(state, AgentError::ModelInvocation(e), sink);
                return;
            }
        };
        let decision = ObservationDecision::parse_or_fallback(&raw);

        let output_text = result.output.to_string();
        state.inner_messages.push(Message::user(format!(
            "工具 {} 返回：\n{}",
            result.tool,
            preview(&output_text, TRACE_OUTPUT_CHARS)
        )));

        let step = state.current_step.clone();
        let analysis = decision.analysis.trim().to_string();
        if !analysis.is_empty() {
            let folded = fold_summary(
                state.context.summaries.get(&step).map(String::as_str),
                &analysis,
                self.config.summary_max_chars,
            );
            state.context.summaries.insert(step.clone(), folded);
            let note = ProfileNote {
                step: step.clone(),
                analysis: analysis.clone(),
                iteration: state.iteration_count + 1,
            };
            if let Some(c) = state.context.profile.add_note(note) {
                tracing::info!(topic = %c.topic, step = %c.step, "possible contradiction in user profile");
                state.log("发现可能的矛盾", json!({ "topic": c.topic }));
            }
            state.inner_messages.push(Message::assistant(format!("观察分析：{}", analysis)));
        }

        *state.context.step_rounds.entry(step.clone()).or_insert(0) += 1;
        state.iteration_count += 1;

        send_event(
            sink,
            ReactEvent::Observation {
                tool: result.tool.clone(),
                preview: preview(&output_text, 200),
            },
        );
        state.log(
            "观察完成",
            json!({
                "tool": result.tool,
                "should_continue": decision.should_continue,
                "next_action": decision.next_action,
                "step_rounds": state.context.step_rounds.get(&step).copied().unwrap_or(0),
                "iteration": state.iteration_count,
            }),
        );

        if decision.should_continue {
            state.should_continue = true;
        } else {
            match decision.response.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
                Some(r) => state.finish(r.to_string()),
                None => state.should_continue = false,
            }
        }
        state.context.last_observation = Some(decision);
    }
}
