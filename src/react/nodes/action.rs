//! 行动节点：执行推理节点的决策。use_tool 调用工具；respond / guide 写入最终回复并结束循环

use serde_json::json;

use crate::core::state::{ToolResult, TurnState};
use crate::core::AgentError;
use crate::react::decision::ReasoningDecision;
use crate::react::events::{send_event, ReactEvent, StreamSink};
use crate::react::graph::AgentGraph;

use super::fail_turn;

impl AgentGraph {
    pub(crate) async fn action(&self, state: &mut TurnState, sink: Option<&StreamSink>) {
        send_event(sink, ReactEvent::Node { name: "action".into() });

        let Some(decision) = state.context.last_decision.clone() else {
            state.should_continue = false;
            return;
        };

        match decision {
            ReasoningDecision::UseTool { tool_name, tool_input, .. } => {
                let Some(name) = tool_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) else {
                    fail_turn(state, AgentError::MissingToolName, sink);
                    return;
                };
                let input = if tool_input.is_null() { json!({}) } else { tool_input };
                send_event(sink, ReactEvent::ToolCall { tool: name.clone(), args: input.clone() });

                match self.executor.execute(&name, input.clone(), state).await {
                    Ok(output) => {
                        let result = ToolResult {
                            tool: name.clone(),
                            input,
                            output: output.clone(),
                        };
                        state.tools_used.push(name.clone());
                        state.tool_results.push(result.clone());
                        state.context.last_tool_result = Some(output);
                        state.context.pending_tool_result = Some(result);
                        state.log("工具调用完成", json!({ "tool": name }));
                    }
                    Err(e) => fail_turn(state, e, sink),
                }
            }
            ReasoningDecision::Respond { response, .. } | ReasoningDecision::Guide { response, .. } => {
                state.log("生成回复", json!({ "length": response.chars().count() }));
                state.finish(response);
            }
        }
    }
}
