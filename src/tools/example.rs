//! example_tool：按查询找相似的示例条目（最多 5 个；未指定类别时每类取 3 个再合并排序）

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::state::TurnState;
use crate::knowledge::KnowledgeBase;
use crate::tools::schema::{parse_input, schema_value, QueryInput};
use crate::tools::search::empty_query;
use crate::tools::Tool;

const MAX_EXAMPLES: usize = 5;
const PER_CATEGORY: usize = 3;

pub struct ExampleTool {
    kb: Arc<KnowledgeBase>,
}

impl ExampleTool {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for ExampleTool {
    fn name(&self) -> &str {
        "example_tool"
    }

    fn description(&self) -> &str {
        "查找与用户描述相似的示例（价值观、兴趣、才能）。输入: {\"query\": \"文本\", \"category\": \"values|interests|strengths\"(可选)}"
    }

    fn input_schema(&self) -> Value {
        schema_value::<QueryInput>()
    }

    async fn execute(&self, input: Value, _state: &TurnState) -> Result<Value, String> {
        let QueryInput { query, category } = parse_input(&input);
        let query = query.trim();
        if query.is_empty() {
            return Ok(empty_query());
        }
        let per_category = if category.is_some() { MAX_EXAMPLES } else { PER_CATEGORY };
        let examples = self
            .kb
            .search(query, category.as_deref(), per_category, MAX_EXAMPLES);
        Ok(json!({
            "success": true,
            "query": query,
            "examples": examples,
            "count": examples.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::TurnRequest;
    use crate::knowledge::{ContentFile, InterestItem};

    #[tokio::test]
    async fn test_examples_capped_at_five() {
        let interests = (1..=8)
            .map(|i| InterestItem { id: i, name: format!("music{i}") })
            .collect();
        let kb = KnowledgeBase::new(ContentFile { interests, ..Default::default() });
        let tool = ExampleTool::new(Arc::new(kb));
        let state = TurnState::new(TurnRequest::new("s", "hi", "interests_exploration"));

        let out = tool
            .execute(json!({"query": "music", "category": "interests"}), &state)
            .await
            .unwrap();
        assert_eq!(out["count"], 5);

        let out = tool.execute(json!({"query": "music"}), &state).await.unwrap();
        assert_eq!(out["count"], 3);
    }
}
