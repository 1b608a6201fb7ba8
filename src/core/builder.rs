//! 编排器构建器：统一的组件初始化逻辑
//!
//! 二进制入口与集成测试共用同一套装配：模型、工具注册表、进度追踪器、压缩器与会话缓存。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::cache::GraphCache;
use crate::core::orchestrator::{create_llm_from_config, Orchestrator};
use crate::knowledge::{ContentLoader, KnowledgeBase};
use crate::llm::LlmClient;
use crate::progress::{CardSynthesizer, ProgressTracker};
use crate::react::ContextCompressor;
use crate::tools::{builtin_registry, Tool, ToolExecutor, ToolRegistry};

pub struct OrchestratorBuilder {
    config: AppConfig,
    knowledge: Arc<KnowledgeBase>,
    llm: Option<Arc<dyn LlmClient>>,
    extra_tools: Vec<Arc<dyn Tool>>,
}

impl OrchestratorBuilder {
    pub fn new(config: AppConfig, knowledge: KnowledgeBase) -> Self {
        Self {
            config,
            knowledge: Arc::new(knowledge),
            llm: None,
            extra_tools: Vec::new(),
        }
    }

    /// 指定模型客户端（测试用脚本化客户端）；不指定时按配置与环境变量选择
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// 追加工具；与内置工具同名时覆盖
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.extra_tools.push(Arc::new(tool));
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn build_llm(&self) -> Arc<dyn LlmClient> {
        match &self.llm {
            Some(llm) => llm.clone(),
            None => create_llm_from_config(&self.config),
        }
    }

    /// 内置知识库工具 + 追加工具
    pub fn build_tool_registry(&self) -> ToolRegistry {
        let mut tools = builtin_registry(self.knowledge.clone(), self.config.tools.search_max_results);
        for tool in &self.extra_tools {
            tools.register_arc(tool.clone());
        }
        tools
    }

    pub fn build_tracker(&self, llm: Arc<dyn LlmClient>) -> ProgressTracker {
        let loader: Arc<dyn ContentLoader> = self.knowledge.clone();
        let cards = CardSynthesizer::new(llm).with_temperature(self.config.llm.temperatures.observation);
        ProgressTracker::new(loader, self.knowledge.goal_book(), cards)
    }

    pub fn build_compressor(&self) -> ContextCompressor {
        let c = &self.config.context;
        ContextCompressor::new(c.max_messages, c.keep_latest, c.fold_max_chars)
    }

    pub fn build(self) -> Orchestrator {
        let llm = self.build_llm();
        let registry = Arc::new(self.build_tool_registry());
        tracing::info!(tools = ?registry.tool_names(), "tool registry ready");
        let executor = Arc::new(ToolExecutor::new(registry, self.config.tools.tool_timeout_secs));
        let tracker = Arc::new(self.build_tracker(llm.clone()));
        let compressor = self.build_compressor();
        let cache = Arc::new(GraphCache::new(self.config.cache_settings()));

        Orchestrator::new(
            llm,
            executor,
            tracker,
            compressor,
            cache,
            self.config.run_config(),
        )
    }
}
