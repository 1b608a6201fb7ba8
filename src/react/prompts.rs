//! 提示词模板：推理、观察、引导

use crate::core::state::{ToolResult, TurnState};
use crate::progress::steps::{category_for_step, category_label, step_theory};
use crate::react::events::preview;
use crate::react::stream::DECISION_MARKER;
use crate::tools::decision_schema_json;

/// 咨询师人设与回应原则
pub const COUNSELOR_GUIDELINES: &str = "你是一位温和、专业的职业咨询师，正在陪伴用户完成一次自我探索访谈（价值观 → 才能 → 兴趣 → 综合）。\n\
回应原则：\n\
- 简短、温暖、鼓励性的回应（1-3 句话），使用共情式语言（\"我理解\"、\"听起来\"）\n\
- 用户回答浅显时，用开放式问题引导（\"能具体说说吗？\"、\"这让你有什么感受？\"）\n\
- 不要长篇大论，不要过早下结论，不要质疑用户的想法，不要急于转移话题\n\
- 每道题 3-5 轮对话即可，不要过度挖掘";

const DECISION_RULES: &str = "决策规则：\n\
- 需要查询价值观/才能/兴趣条目、示例或引导题时，action 为 use_tool，并给出 tool_name 与 tool_input\n\
- 可以直接回应用户时，action 为 respond，response 为给用户的回复\n\
- 用户卡住、需要鼓励时，action 为 guide，response 为引导语";

const JSON_ONLY_FORMAT: &str = "只返回一个 JSON 对象，格式：\n\
{\"action\": \"use_tool|respond|guide\", \"tool_name\": \"...\", \"tool_input\": {...}, \"response\": \"...\", \"rationale\": \"...\"}";

/// 流式模式：先写给用户看的回复，再写分隔标记和 JSON
fn streaming_format() -> String {
    format!(
        "先直接写出给用户的回复文本（如果需要调用工具，可以写一句过渡语或不写），\n\
         然后单独一行写 {marker}，再写一个 JSON 对象：\n\
         {{\"action\": \"use_tool|respond|guide\", \"tool_name\": \"...\", \"tool_input\": {{...}}, \"response\": \"\", \"rationale\": \"...\"}}\n\
         respond 时 response 可以留空，表示使用标记前的文本。",
        marker = DECISION_MARKER
    )
}

/// 推理节点 system 提示词；tools_schema 为注册表导出的工具 JSON Schema
pub fn reasoning_system(
    state: &TurnState,
    tools: &[(String, String)],
    tools_schema: &str,
    streaming: bool,
) -> String {
    let mut sections = vec![COUNSELOR_GUIDELINES.to_string()];

    let theory = step_theory(&state.current_step);
    sections.push(format!(
        "当前步骤：{}（{}）",
        state.current_step, theory.purpose
    ));

    if let Some(brief) = &state.context.question_brief {
        sections.push(format!("题目进度：\n{}", brief.render()));
    }
    if let Some(summary) = state.current_summary() {
        sections.push(format!("本步骤已有的观察摘要：\n{}", summary));
    }
    if !state.context.knowledge_snippets.is_empty() {
        sections.push(format!(
            "知识库相关条目（回答时优先参考）：\n{}",
            state.context.knowledge_snippets.join("\n")
        ));
    }
    if !state.tools_used.is_empty() {
        sections.push(format!("本轮已调用的工具：{}", state.tools_used.join(", ")));
    }
    if !tools.is_empty() {
        let list = tools
            .iter()
            .map(|(name, desc)| format!("- {}: {}", name, desc))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("可用工具：\n{}", list));
        if !tools_schema.trim().is_empty() {
            sections.push(format!("工具输入格式（JSON Schema）：\n{}", tools_schema));
        }
    }

    sections.push(DECISION_RULES.to_string());
    sections.push(if streaming {
        streaming_format()
    } else {
        JSON_ONLY_FORMAT.to_string()
    });
    sections.push(format!("决策 JSON Schema：\n{}", decision_schema_json()));
    sections.join("\n\n")
}

pub const OBSERVATION_SYSTEM: &str = "你是职业咨询师的助手，负责分析工具返回的结果，决定是否还需要继续查询。\n\
只返回一个 JSON 对象：{\"should_continue\": true/false, \"next_action\": \"...\", \"analysis\": \"对用户的一句话洞察\", \"response\": \"不再继续时给用户的回复\"}";

pub fn observation_prompt(state: &TurnState, result: &ToolResult) -> String {
    let mut parts = vec![
        format!("用户输入：{}", state.user_input),
        format!("调用的工具：{}", result.tool),
        format!("工具输入：{}", result.input),
        format!("工具输出：\n{}", preview(&result.output.to_string(), 3000)),
    ];
    if let Some(summary) = state.current_summary() {
        parts.push(format!("此前的观察摘要：\n{}", summary));
    }
    parts.join("\n\n")
}

pub const GUIDE_USER_PROMPT: &str = "请给出一句鼓励用户继续分享的话。";

/// 引导节点提示词（空闲提醒）
pub fn guide_system(state: &TurnState) -> String {
    let category = category_for_step(&state.current_step).unwrap_or("");
    let current_question = state
        .question_progress
        .get(&state.current_step)
        .and_then(|s| s.current_question())
        .map(|q| q.content.clone());
    let mut lines = vec![
        COUNSELOR_GUIDELINES.to_string(),
        format!(
            "用户已经有一段时间没有回复。当前在探索「{}」。",
            if category.is_empty() { state.current_step.as_str() } else { category_label(category) }
        ),
    ];
    if let Some(q) = current_question {
        lines.push(format!("当前题目：{}", q));
    }
    if let Some(summary) = state.current_summary() {
        lines.push(format!("已知的观察：{}", summary));
    }
    lines.push("请用一两句温暖、不施压的话邀请用户继续，可以给一个具体的思考角度。直接输出这句话，不要 JSON。".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::TurnRequest;

    #[test]
    fn test_reasoning_system_includes_tools_and_format() {
        let st = TurnState::new(TurnRequest::new("s", "hi", "values_exploration"));
        let tools = vec![("search_tool".to_string(), "search".to_string())];
        let schema = r#"[{"name":"search_tool","input_schema":{"properties":{"query":{}}}}]"#;
        let p = reasoning_system(&st, &tools, schema, false);
        assert!(p.contains("- search_tool: search"));
        assert!(p.contains("\"action\""));
        assert!(p.contains(schema));
        assert!(p.contains(&decision_schema_json()));
        assert!(!p.contains(DECISION_MARKER));
        assert!(reasoning_system(&st, &tools, schema, true).contains(DECISION_MARKER));
        assert!(!reasoning_system(&st, &[], schema, false).contains("JSON Schema）"));
    }

    #[test]
    fn test_guide_system_mentions_category() {
        let st = TurnState::new(TurnRequest::new("s", "", "interests_exploration"));
        assert!(guide_system(&st).contains("兴趣与热情"));
    }
}
