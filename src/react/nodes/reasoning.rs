//! 推理节点：首次进入时准备题目流程与知识预取，之后每次压缩上下文并请求模型决策

use futures_util::StreamExt;
use serde_json::{json, Value};

use crate::core::state::TurnState;
use crate::core::AgentError;
use crate::knowledge::should_force_knowledge_query;
use crate::llm::LlmError;
use crate::memory::Message;
use crate::progress::steps::category_for_step;
use crate::react::decision::ReasoningDecision;
use crate::react::events::{send_event, ReactEvent, StreamSink};
use crate::react::graph::AgentGraph;
use crate::react::prompts;
use crate::react::stream::{split_decision, MarkerSplitter, DECISION_MARKER};

use super::fail_turn;

const SEARCH_TOOL: &str = "search_tool";
const MAX_SNIPPETS: usize = 5;

/// 一次模型调用拆出的两部分；prefix 为已展示给用户的文本
struct RawDecision {
    prefix: String,
    decision: String,
    had_marker: bool,
}

impl RawDecision {
    fn trace_text(&self) -> String {
        if !self.had_marker || self.prefix.trim().is_empty() {
            self.decision.trim().to_string()
        } else {
            format!("{}\n{}\n{}", self.prefix.trim(), DECISION_MARKER, self.decision.trim())
        }
    }
}

/// 把检索结果转为提示词里的一行
fn snippet_from_hit(hit: &Value) -> Option<String> {
    let name = hit.get("name").and_then(Value::as_str)?;
    let detail = ["definition", "strengths"]
        .iter()
        .filter_map(|k| hit.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty());
    Some(match detail {
        Some(d) => format!("- {}：{}", name, d),
        None => format!("- {}", name),
    })
}

impl AgentGraph {
    pub(crate) async fn reasoning(&self, state: &mut TurnState, sink: Option<&StreamSink>) {
        send_event(sink, ReactEvent::Node { name: "reasoning".into() });

        if !state.context.prepared {
            state.context.prepared = true;
            if !state.user_input.trim().is_empty() {
                state.inner_messages.push(Message::user(state.user_input.clone()));
            }
            if self.tracker.prepare_turn(state).await.is_some() {
                if let Some(card) = &state.answer_card {
                    send_event(sink, ReactEvent::AnswerCard { question_id: card.question_id });
                }
            }
            if should_force_knowledge_query(&state.current_step, &state.user_input) {
                self.prefetch_knowledge(state).await;
            }
        }

        if self.config.compress_context {
            if let Some(report) = self.compressor.compress(&mut state.inner_messages) {
                state.log(
                    "上下文已压缩",
                    json!({ "total_before": report.before, "total_after": report.after }),
                );
                send_event(
                    sink,
                    ReactEvent::ContextFolded { before: report.before, after: report.after },
                );
            }
        }

        send_event(sink, ReactEvent::Thinking { iteration: state.iteration_count });
        let registry = self.executor.registry();
        let tools = registry.tool_descriptions();
        let system =
            prompts::reasoning_system(state, &tools, &registry.to_schema_json(), sink.is_some());
        let mut messages = Vec::with_capacity(state.inner_messages.len() + 1);
        messages.push(Message::system(system));
        messages.extend(state.inner_messages.iter().cloned());

        let raw = match sink {
            Some(tx) => self.stream_decision(&messages, tx).await,
            None => self
                .llm
                .chat(&messages, self.config.temperatures.reasoning)
                .await
                .map(|full| {
                    let (prefix, decision) = split_decision(&full);
                    RawDecision {
                        prefix: prefix.to_string(),
                        decision: decision.to_string(),
                        had_marker: full.contains(DECISION_MARKER),
                    }
                }),
        };
        let raw = match raw {
            Ok(r) => r,
            Err(e) => {
                fail_turn(state, AgentError::ModelInvocation(e), sink);
                return;
            }
        };

        let mut decision = match ReasoningDecision::parse(&raw.decision) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "reasoning output not structured, responding with raw text");
                if raw.had_marker && !raw.prefix.trim().is_empty() {
                    ReasoningDecision::text_only(&raw.prefix)
                } else {
                    ReasoningDecision::text_only(&raw.decision)
                }
            }
        };
        decision.fill_empty_response(&raw.prefix);

        state.inner_messages.push(Message::assistant(raw.trace_text()));
        let rationale = match &decision {
            ReasoningDecision::UseTool { rationale, .. }
            | ReasoningDecision::Respond { rationale, .. }
            | ReasoningDecision::Guide { rationale, .. } => rationale.clone(),
        };
        state.log(
            "推理完成",
            json!({
                "action": decision.action_name(),
                "rationale": rationale,
                "iteration": state.iteration_count,
            }),
        );
        state.context.last_decision = Some(decision);
    }

    /// 流式调用：标记前的片段立即推送，标记后的部分缓冲
    async fn stream_decision(
        &self,
        messages: &[Message],
        sink: &StreamSink,
    ) -> Result<RawDecision, LlmError> {
        let mut stream = self
            .llm
            .chat_stream(messages, self.config.temperatures.reasoning)
            .await?;
        let mut splitter = MarkerSplitter::new();
        while let Some(fragment) = stream.next().await {
            let text = splitter.push(&fragment?);
            if !text.is_empty() {
                send_event(Some(sink), ReactEvent::MessageChunk { text });
            }
        }
        let out = splitter.finish();
        if !out.tail.is_empty() {
            send_event(Some(sink), ReactEvent::MessageChunk { text: out.tail });
        }
        Ok(RawDecision {
            prefix: out.prefix,
            decision: out.decision,
            had_marker: out.had_marker,
        })
    }

    /// 通过已注册的 search_tool 预取知识片段；失败只记录，不影响本轮
    async fn prefetch_knowledge(&self, state: &mut TurnState) {
        if self.executor.get_tool(SEARCH_TOOL).is_none() {
            tracing::debug!("search_tool not registered, skip knowledge prefetch");
            return;
        }
        let input = json!({
            "query": state.user_input,
            "category": category_for_step(&state.current_step),
        });
        match self.executor.execute(SEARCH_TOOL, input, state).await {
            Ok(output) => {
                let snippets: Vec<String> = output
                    .get("results")
                    .and_then(Value::as_array)
                    .map(|hits| hits.iter().filter_map(snippet_from_hit).take(MAX_SNIPPETS).collect())
                    .unwrap_or_default();
                state.log("预取知识片段", json!({ "count": snippets.len() }));
                state.context.knowledge_snippets = snippets;
            }
            Err(e) => {
                tracing::warn!(error = %e, "knowledge prefetch failed");
            }
        }
    }
}
