//! Compass - 自我探索访谈编排核心
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、单轮状态、会话图缓存、编排器
//! - **knowledge**: 题库与知识库内容、中文分词检索
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **memory**: 对话消息
//! - **observability**: 日志初始化
//! - **progress**: 步骤目录、题目进度、充分性判定与答题卡
//! - **react**: 推理/行动/观察状态机、上下文压缩、流式事件
//! - **tools**: 工具注册表、执行器与知识库工具

pub mod config;
pub mod core;
pub mod knowledge;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod progress;
pub mod react;
pub mod tools;

pub use crate::core::{Orchestrator, OrchestratorBuilder, TurnOutcome, TurnRequest};
