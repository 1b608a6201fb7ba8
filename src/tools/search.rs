//! search_tool：在知识库中检索价值观、兴趣、才能或题目

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::state::TurnState;
use crate::knowledge::KnowledgeBase;
use crate::tools::schema::{parse_input, schema_value, QueryInput};
use crate::tools::Tool;

const PER_CATEGORY: usize = 5;
const MAX_RESULTS: usize = 10;

pub struct SearchTool {
    kb: Arc<KnowledgeBase>,
    max_results: usize,
}

impl SearchTool {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self {
            kb,
            max_results: MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }
}

/// 查询为空时的统一返回（工具本身成功，负载表示失败）
pub(crate) fn empty_query() -> Value {
    json!({ "success": false, "error": "查询内容不能为空" })
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search_tool"
    }

    fn description(&self) -> &str {
        "在知识库中搜索相关内容（价值观、兴趣、才能、问题）。输入: {\"query\": \"文本\", \"category\": \"values|interests|strengths|questions\"(可选)}"
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
        let hits = self
            .kb
            .search(query, category.as_deref(), PER_CATEGORY, self.max_results);
        Ok(json!({
            "success": true,
            "query": query,
            "category": category,
            "count": hits.len(),
            "results": hits,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::TurnRequest;
    use crate::knowledge::{ContentFile, ValueItem};

    fn tool() -> SearchTool {
        let kb = KnowledgeBase::new(ContentFile {
            values: vec![
                ValueItem { id: 1, name: "诚实".into(), definition: "坦诚".into() },
                ValueItem { id: 2, name: "自由".into(), definition: "自主选择".into() },
            ],
            ..Default::default()
        });
        SearchTool::new(Arc::new(kb))
    }

    fn state() -> TurnState {
        TurnState::new(TurnRequest::new("s", "hi", "values_exploration"))
    }

    #[tokio::test]
    async fn test_empty_query_is_negative_payload() {
        let out = tool().execute(json!({"query": "  "}), &state()).await.unwrap();
        assert_eq!(out["success"], false);
        assert!(out["error"].is_string());
    }

    #[tokio::test]
    async fn test_search_returns_hits() {
        let out = tool()
            .execute(json!({"query": "我最看重自由", "category": "values"}), &state())
            .await
            .unwrap();
        assert_eq!(out["success"], true);
        assert_eq!(out["results"][0]["name"], "自由");
        assert_eq!(out["results"][0]["type"], "value");
    }
}
