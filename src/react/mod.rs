//! 编排层：状态机、节点、决策解析、上下文压缩、画像与流式事件

pub mod context;
pub mod decision;
pub mod events;
pub mod graph;
pub mod nodes;
pub mod profile;
pub mod prompts;
pub mod stream;

pub use context::{ContextCompressor, FoldReport};
pub use decision::{ObservationDecision, ReasoningDecision};
pub use events::{ReactEvent, StreamSink};
pub use graph::{transition, AgentGraph, ContinuationPolicy, Node, RunConfig, Temperatures};
pub use nodes::{APOLOGY_MESSAGE, NO_REPLY_MESSAGE};
pub use profile::{Contradiction, Profile, ProfileNote};
pub use stream::DECISION_MARKER;
