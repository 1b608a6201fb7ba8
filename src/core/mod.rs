//! 核心层：错误类型、单轮状态、会话图缓存、构建器与编排器

pub mod builder;
pub mod cache;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use builder::OrchestratorBuilder;
pub use cache::{CacheSettings, CacheStats, GraphCache};
pub use error::AgentError;
pub use orchestrator::Orchestrator;
pub use state::{LogEntry, ToolResult, TurnContext, TurnOutcome, TurnRequest, TurnState};
