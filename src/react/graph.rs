//! 编排状态机
//!
//! 节点：reasoning → action → observation →（回到 reasoning | 进入 output）；guide 为独立入口（空闲提醒）。
//! 转移由纯函数 transition 决定，只看当前节点与状态；output 每轮恰好执行一次。

use std::sync::Arc;

use crate::core::state::TurnState;
use crate::llm::LlmClient;
use crate::progress::ProgressTracker;
use crate::react::context::ContextCompressor;
use crate::react::events::StreamSink;
use crate::tools::ToolExecutor;

/// 状态机节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Reasoning,
    Action,
    Observation,
    Guide,
    Output,
    End,
}

impl Node {
    pub fn name(&self) -> &'static str {
        match self {
            Node::Reasoning => "reasoning",
            Node::Action => "action",
            Node::Observation => "observation",
            Node::Guide => "guide",
            Node::Output => "output",
            Node::End => "end",
        }
    }
}

/// 各节点使用的采样温度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperatures {
    pub reasoning: f32,
    pub observation: f32,
    pub guide: f32,
}

impl Default for Temperatures {
    fn default() -> Self {
        Self {
            reasoning: 0.7,
            observation: 0.5,
            guide: 0.8,
        }
    }
}

/// 运行配置（与编译好的图一起缓存）
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// 关闭后循环结束直接结束，不写用户可见消息（仅调试用）
    pub use_output_node: bool,
    pub max_iterations: u32,
    pub compress_context: bool,
    pub max_rounds_per_step: u32,
    /// 步骤滚动摘要的字符上限
    pub summary_max_chars: usize,
    pub temperatures: Temperatures,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            use_output_node: true,
            max_iterations: 10,
            compress_context: true,
            max_rounds_per_step: 5,
            summary_max_chars: 1200,
            temperatures: Temperatures::default(),
        }
    }
}

/// 继续循环的条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationPolicy {
    pub max_iterations: u32,
    pub max_rounds_per_step: u32,
}

impl ContinuationPolicy {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            max_rounds_per_step: config.max_rounds_per_step,
        }
    }

    /// 有错误、继续标志为 false、全局迭代达到上限、当前步骤轮数达到上限时停止
    pub fn should_continue(&self, state: &TurnState) -> bool {
        if state.error.is_some() || !state.should_continue {
            return false;
        }
        if state.iteration_count >= self.max_iterations {
            return false;
        }
        let cap = state
            .context
            .max_rounds_per_step
            .unwrap_or(self.max_rounds_per_step);
        state.step_rounds() < cap
    }
}

/// 纯转移函数
pub fn transition(
    node: Node,
    state: &TurnState,
    policy: &ContinuationPolicy,
    use_output_node: bool,
) -> Node {
    let finish = if use_output_node { Node::Output } else { Node::End };
    match node {
        Node::Reasoning if state.error.is_some() => finish,
        Node::Reasoning => Node::Action,
        Node::Action => Node::Observation,
        Node::Observation if policy.should_continue(state) => Node::Reasoning,
        Node::Observation => finish,
        Node::Guide => finish,
        Node::Output | Node::End => Node::End,
    }
}

/// 编译好的编排图：持有模型、工具执行器、进度追踪器与压缩器
pub struct AgentGraph {
    pub(crate) llm: Arc<dyn LlmClient>,
    pub(crate) executor: Arc<ToolExecutor>,
    pub(crate) tracker: Arc<ProgressTracker>,
    pub(crate) compressor: ContextCompressor,
    pub(crate) config: RunConfig,
}

impl AgentGraph {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        executor: Arc<ToolExecutor>,
        tracker: Arc<ProgressTracker>,
        compressor: ContextCompressor,
        config: RunConfig,
    ) -> Self {
        Self {
            llm,
            executor,
            tracker,
            compressor,
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn policy(&self) -> ContinuationPolicy {
        ContinuationPolicy::from_config(&self.config)
    }

    /// 处理一条用户消息
    pub async fn invoke(&self, state: TurnState, sink: Option<&StreamSink>) -> TurnState {
        self.run_from(Node::Reasoning, state, sink).await
    }

    /// 空闲提醒入口
    pub async fn nudge(&self, state: TurnState, sink: Option<&StreamSink>) -> TurnState {
        self.run_from(Node::Guide, state, sink).await
    }

    pub async fn run_from(
        &self,
        entry: Node,
        mut state: TurnState,
        sink: Option<&StreamSink>,
    ) -> TurnState {
        let policy = self.policy();
        let mut node = entry;
        while node != Node::End {
            tracing::debug!(session = %state.session_id, node = node.name(), "enter node");
            match node {
                Node::Reasoning => self.reasoning(&mut state, sink).await,
                Node::Action => self.action(&mut state, sink).await,
                Node::Observation => self.observation(&mut state, sink).await,
                Node::Guide => self.guide(&mut state, sink).await,
                Node::Output => self.output(&mut state, sink),
                Node::End => {}
            }
            node = transition(node, &state, &policy, self.config.use_output_node);
        }
        tracing::info!(
            session = %state.session_id,
            iterations = state.iteration_count,
            tools = state.tools_used.len(),
            error = state.error.is_some(),
            "turn finished"
        );
        state
    }
}
