//! guide_tool：取当前步骤类别的引导题（星标题优先，最多 5 道）

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::state::TurnState;
use crate::knowledge::KnowledgeBase;
use crate::progress::steps::category_for_step;
use crate::tools::schema::{parse_input, schema_value, GuideInput};
use crate::tools::Tool;

const MAX_GUIDED: usize = 5;

pub struct GuideTool {
    kb: Arc<KnowledgeBase>,
}

impl GuideTool {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for GuideTool {
    fn name(&self) -> &str {
        "guide_tool"
    }

    fn description(&self) -> &str {
        "获取当前步骤的引导问题。输入: {\"step\": \"步骤 id\"(可选，默认当前步骤)}"
    }

    fn input_schema(&self) -> Value {
        schema_value::<GuideInput>()
    }

    async fn execute(&self, input: Value, state: &TurnState) -> Result<Value, String> {
        let GuideInput { step } = parse_input(&input);
        let step = step.unwrap_or_else(|| state.current_step.clone());
        let Some(category) = category_for_step(&step) else {
            return Ok(json!({
                "success": false,
                "error": format!("步骤没有引导问题: {}", step),
            }));
        };
        let questions: Vec<Value> = self
            .kb
            .guided_questions(category, MAX_GUIDED)
            .into_iter()
            .map(|q| json!({ "id": q.id, "content": q.content, "starred": q.starred }))
            .collect();
        Ok(json!({
            "success": true,
            "step": step,
            "category": category,
            "questions": questions,
        }))
    }
}
