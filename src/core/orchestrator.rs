//! 编排器：对外入口
//!
//! 持有共享的模型、工具执行器、进度追踪器与会话图缓存；
//! 每条消息按 session_id 取（或构建）编排图，跑完一轮后把状态投影为 TurnOutcome 返回。

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::core::cache::{CacheStats, GraphCache};
use crate::core::state::{TurnOutcome, TurnRequest, TurnState};
use crate::llm::{create_deepseek_client, LlmClient, MockLlmClient, OpenAiClient};
use crate::progress::ProgressTracker;
use crate::react::{AgentGraph, ContextCompressor, RunConfig, StreamSink};
use crate::tools::ToolExecutor;

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容 / Mock）
pub(crate) fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    if provider == "mock" {
        tracing::info!("Using Mock LLM (configured)");
        return Arc::new(MockLlmClient);
    }
    // 有 DeepSeek Key 或（配置为 deepseek 且仅有 OpenAI Key 时也走 DeepSeek 兼容端点）
    let use_deepseek = std::env::var("DEEPSEEK_API_KEY").is_ok()
        || (provider == "deepseek" && std::env::var("OPENAI_API_KEY").is_ok());
    let use_openai = std::env::var("OPENAI_API_KEY").is_ok() && provider != "deepseek";
    let timeout = cfg.llm.timeouts.request;

    if use_deepseek {
        let model = cfg
            .llm
            .deepseek
            .model
            .clone()
            .unwrap_or_else(|| cfg.llm.model.clone());
        tracing::info!("Using DeepSeek LLM ({})", model);
        Arc::new(create_deepseek_client(Some(&model)).with_request_timeout(timeout))
    } else if use_openai {
        let model = cfg
            .llm
            .openai
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let base = cfg.llm.base_url.as_deref();
        tracing::info!("Using OpenAI LLM ({})", model);
        Arc::new(
            OpenAiClient::new(base, &model, std::env::var("OPENAI_API_KEY").ok().as_deref())
                .with_request_timeout(timeout),
        )
    } else {
        tracing::warn!("No API key set or provider unknown, using Mock LLM");
        Arc::new(MockLlmClient)
    }
}

pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    executor: Arc<ToolExecutor>,
    tracker: Arc<ProgressTracker>,
    compressor: ContextCompressor,
    cache: Arc<GraphCache<AgentGraph>>,
    run_config: RunConfig,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        executor: Arc<ToolExecutor>,
        tracker: Arc<ProgressTracker>,
        compressor: ContextCompressor,
        cache: Arc<GraphCache<AgentGraph>>,
        run_config: RunConfig,
    ) -> Self {
        Self {
            llm,
            executor,
            tracker,
            compressor,
            cache,
            run_config,
        }
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    pub fn cache(&self) -> &Arc<GraphCache<AgentGraph>> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        &self.tracker
    }

    /// 取会话的编排图；运行配置与缓存中的不同则重建
    pub fn graph_for(&self, session_id: &str, config: &RunConfig) -> Arc<AgentGraph> {
        self.cache.get_or_create(session_id, config, |cfg| {
            tracing::info!(session = %session_id, "building orchestration graph");
            AgentGraph::new(
                self.llm.clone(),
                self.executor.clone(),
                self.tracker.clone(),
                self.compressor.clone(),
                cfg.clone(),
            )
        })
    }

    /// 处理一条用户消息
    pub async fn run_turn(&self, request: TurnRequest, sink: Option<StreamSink>) -> TurnOutcome {
        let config = self.run_config.clone();
        self.run_turn_with(request, &config, sink).await
    }

    /// 使用指定运行配置处理一条消息
    pub async fn run_turn_with(
        &self,
        request: TurnRequest,
        config: &RunConfig,
        sink: Option<StreamSink>,
    ) -> TurnOutcome {
        let graph = self.graph_for(&request.session_id, config);
        let state = TurnState::new(request);
        graph.invoke(state, sink.as_ref()).await.into_outcome()
    }

    /// 用户长时间无输入时的引导提问；request.user_input 通常为空
    pub async fn nudge(&self, request: TurnRequest, sink: Option<StreamSink>) -> TurnOutcome {
        let graph = self.graph_for(&request.session_id, &self.run_config);
        let state = TurnState::new(request);
        graph.nudge(state, sink.as_ref()).await.into_outcome()
    }

    /// 会话结束时主动释放缓存
    pub fn end_session(&self, session_id: &str) -> bool {
        self.cache.remove(session_id)
    }

    pub fn spawn_cache_cleanup(&self) -> JoinHandle<()> {
        self.cache.spawn_cleanup()
    }
}
