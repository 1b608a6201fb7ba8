//! 工具层：注册表、执行器与知识库工具（search_tool / guide_tool / example_tool）

pub mod example;
pub mod executor;
pub mod guide;
pub mod registry;
pub mod schema;
pub mod search;

use std::sync::Arc;

use crate::knowledge::KnowledgeBase;

pub use example::ExampleTool;
pub use executor::ToolExecutor;
pub use guide::GuideTool;
pub use registry::{Tool, ToolRegistry};
pub use schema::decision_schema_json;
pub use search::SearchTool;

/// 注册内置的三个知识库工具
pub fn builtin_registry(kb: Arc<KnowledgeBase>, search_max_results: usize) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(SearchTool::new(kb.clone()).with_max_results(search_max_results));
    registry.register(GuideTool::new(kb.clone()));
    registry.register(ExampleTool::new(kb));
    registry
}
