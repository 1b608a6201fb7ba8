//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `COMPASS__*` 覆盖（双下划线表示嵌套，如 `COMPASS__CACHE__MAX_SIZE=50`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::core::cache::CacheSettings;
use crate::core::AgentError;
use crate::react::{RunConfig, Temperatures};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub context: ContextSection,
    pub cache: CacheSection,
    pub tools: ToolsSection,
    pub content: ContentSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// 新会话的起始步骤
    pub start_step: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "compass".to_string(),
            start_step: crate::progress::steps::VALUES_EXPLORATION.to_string(),
        }
    }
}

/// [llm] 段：后端选择、超时与各节点温度
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock；优先级由 API Key 与 provider 共同决定
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub deepseek: LlmModelSection,
    pub openai: LlmModelSection,
    pub timeouts: LlmTimeoutsSection,
    pub temperatures: LlmTemperaturesSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: crate::llm::DEEPSEEK_CHAT.to_string(),
            base_url: None,
            deepseek: LlmModelSection::default(),
            openai: LlmModelSection::default(),
            timeouts: LlmTimeoutsSection::default(),
            temperatures: LlmTemperaturesSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmModelSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒）
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTemperaturesSection {
    pub reasoning: f32,
    pub observation: f32,
    pub guide: f32,
}

impl Default for LlmTemperaturesSection {
    fn default() -> Self {
        let t = Temperatures::default();
        Self {
            reasoning: t.reasoning,
            observation: t.observation,
            guide: t.guide,
        }
    }
}

/// [agent] 段：循环控制
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub max_iterations: u32,
    pub max_rounds_per_step: u32,
    pub compress_context: bool,
    /// 关闭时不写用户可见消息，仅调试用
    pub use_output_node: bool,
    pub summary_max_chars: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        let run = RunConfig::default();
        Self {
            max_iterations: run.max_iterations,
            max_rounds_per_step: run.max_rounds_per_step,
            compress_context: run.compress_context,
            use_output_node: run.use_output_node,
            summary_max_chars: run.summary_max_chars,
        }
    }
}

/// [context] 段：推理轨迹压缩
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextSection {
    pub max_messages: usize,
    pub keep_latest: usize,
    pub fold_max_chars: usize,
}

impl Default for ContextSection {
    fn default() -> Self {
        Self {
            max_messages: 40,
            keep_latest: 20,
            fold_max_chars: 2000,
        }
    }
}

/// [cache] 段：会话图缓存
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: bool,
    pub ttl_minutes: u64,
    pub max_size: usize,
    pub cleanup_interval_minutes: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_minutes: 15,
            max_size: 20,
            cleanup_interval_minutes: 5,
        }
    }
}

/// [tools] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    pub tool_timeout_secs: u64,
    pub search_max_results: usize,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 30,
            search_max_results: 10,
        }
    }
}

/// [content] 段：题库与知识库文件
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    pub path: PathBuf,
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/content.toml"),
        }
    }
}

impl AppConfig {
    /// 启动时检查明显无效的组合
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.agent.max_iterations == 0 {
            return Err(AgentError::Config("agent.max_iterations 必须大于 0".into()));
        }
        if self.context.max_messages == 0 {
            return Err(AgentError::Config("context.max_messages 必须大于 0".into()));
        }
        if self.context.keep_latest >= self.context.max_messages {
            tracing::warn!(
                keep_latest = self.context.keep_latest,
                max_messages = self.context.max_messages,
                "context.keep_latest >= max_messages, will be clamped"
            );
        }
        if self.cache.enabled && self.cache.max_size == 0 {
            return Err(AgentError::Config("cache.max_size 必须大于 0（或关闭缓存）".into()));
        }
        Ok(())
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            use_output_node: self.agent.use_output_node,
            max_iterations: self.agent.max_iterations,
            compress_context: self.agent.compress_context,
            max_rounds_per_step: self.agent.max_rounds_per_step,
            summary_max_chars: self.agent.summary_max_chars,
            temperatures: Temperatures {
                reasoning: self.llm.temperatures.reasoning,
                observation: self.llm.temperatures.observation,
                guide: self.llm.temperatures.guide,
            },
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            enabled: self.cache.enabled,
            ttl: Duration::from_secs(self.cache.ttl_minutes * 60),
            max_size: self.cache.max_size,
            cleanup_interval: Duration::from_secs(self.cache.cleanup_interval_minutes * 60),
        }
    }
}

/// 从 config 目录加载配置，环境变量 COMPASS__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 COMPASS__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("COMPASS")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_run_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.run_config(), RunConfig::default());
        let cache = cfg.cache_settings();
        assert_eq!(cache.ttl, Duration::from_secs(900));
        assert_eq!(cache.max_size, 20);
        assert_eq!(cfg.context.max_messages, 40);
        assert_eq!(cfg.context.keep_latest, 20);
        assert_eq!(cfg.tools.tool_timeout_secs, 30);
    }

    #[test]
    fn test_validate() {
        assert!(AppConfig::default().validate().is_ok());
        let mut cfg = AppConfig::default();
        cfg.cache.max_size = 0;
        assert!(matches!(cfg.validate(), Err(AgentError::Config(_))));
        cfg.cache.enabled = false;
        assert!(cfg.validate().is_ok());
        cfg.agent.max_iterations = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[agent]\nmax_iterations = 4\n\n[cache]\nenabled = false\n\n[llm.temperatures]\nguide = 0.3"
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.agent.max_iterations, 4);
        assert_eq!(cfg.agent.max_rounds_per_step, 5);
        assert!(!cfg.cache.enabled);
        assert_eq!(cfg.cache.max_size, 20);
        let run = cfg.run_config();
        assert_eq!(run.temperatures.guide, 0.3);
        assert_eq!(run.temperatures.reasoning, 0.7);
    }
}
