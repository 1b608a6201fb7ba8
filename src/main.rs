//! Compass - 自我探索访谈编排核心
//!
//! 入口：初始化日志、加载配置与内容文件、构建编排器，然后从标准输入逐行驱动访谈。
//! 命令：/nudge 引导提问、/step <id> 切换步骤、/stats 缓存统计、/quit 退出。

use std::path::PathBuf;

use anyhow::Context;
use compass::config::{load_config, AppConfig};
use compass::core::TurnOutcome;
use compass::knowledge::{ContentFile, KnowledgeBase};
use compass::progress::steps::next_step;
use compass::progress::ProgressMap;
use compass::react::ReactEvent;
use compass::{observability, OrchestratorBuilder, TurnRequest};
use compass::memory::Message;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// REPL 会话：调用方负责持久化的那部分状态
struct Session {
    id: String,
    step: String,
    history: Vec<Message>,
    progress: ProgressMap,
}

impl Session {
    fn question_index(&self) -> Option<usize> {
        self.progress.get(&self.step).map(|p| p.current_question_index)
    }

    fn absorb(&mut self, outcome: TurnOutcome) {
        let before = self.question_index();
        self.progress = outcome.question_progress;
        let card_shown = outcome.answer_card.as_ref().map(|c| c.should_show).unwrap_or(false);
        let moved_on = matches!((before, self.question_index()), (Some(b), Some(a)) if a != b);
        if card_shown || moved_on {
            // 换题（含跳过）后历史只保留当前题目的对话
            self.history.clear();
        } else {
            self.history = outcome.messages;
        }
        let step_done = self
            .progress
            .get(&self.step)
            .map(|p| p.is_completed())
            .unwrap_or(false);
        if step_done {
            if let Some(next) = next_step(&self.step) {
                println!("[步骤完成，进入 {}]", next);
                self.step = next.to_string();
                self.history.clear();
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    cfg.validate().context("Invalid configuration")?;

    let content = ContentFile::load(&cfg.content.path)
        .with_context(|| format!("Failed to load content file {}", cfg.content.path.display()))?;
    let start_step = cfg.app.start_step.clone();
    let orchestrator = OrchestratorBuilder::new(cfg, KnowledgeBase::new(content)).build();
    let _cleanup = orchestrator.spawn_cache_cleanup();

    let mut session = Session {
        id: uuid::Uuid::new_v4().to_string(),
        step: start_step,
        history: Vec::new(),
        progress: ProgressMap::new(),
    };
    println!("会话 {}，当前步骤 {}。输入 /quit 退出。", session.id, session.step);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let request = |user_input: &str, s: &Session| {
            TurnRequest::new(s.id.clone(), user_input, s.step.clone())
                .with_history(s.history.clone())
                .with_progress(s.progress.clone())
        };

        let outcome = match input {
            "/quit" => break,
            "/stats" => {
                let stats = orchestrator.cache_stats();
                println!("{}", serde_json::to_string_pretty(&stats)?);
                continue;
            }
            "/nudge" => orchestrator.nudge(request("", &session), None).await,
            cmd if cmd.starts_with("/step ") => {
                session.step = cmd.trim_start_matches("/step ").trim().to_string();
                session.history.clear();
                println!("[切换到 {}]", session.step);
                continue;
            }
            text => {
                let (tx, rx) = mpsc::unbounded_channel();
                let printer = tokio::spawn(print_events(rx));
                let outcome = orchestrator.run_turn(request(text, &session), Some(tx)).await;
                let _ = printer.await;
                outcome
            }
        };

        if input == "/nudge" {
            println!("咨询师：{}", outcome.response);
        }
        if let Some(card) = outcome.answer_card.as_ref().filter(|c| c.should_show) {
            println!("\n[答题卡] {}", serde_json::to_string_pretty(card)?);
        }
        if let Some(err) = &outcome.error {
            tracing::warn!(error = %err, "turn ended with error");
        }
        session.absorb(outcome);
    }

    Ok(())
}

/// 打印流式片段；Reply 为准，若与已推送片段不一致则补打完整回复
async fn print_events(mut rx: mpsc::UnboundedReceiver<ReactEvent>) {
    use std::io::Write;

    let mut streamed = String::new();
    print!("咨询师：");
    while let Some(event) = rx.recv().await {
        match event {
            ReactEvent::MessageChunk { text } => {
                print!("{}", text);
                let _ = std::io::stdout().flush();
                streamed.push_str(&text);
            }
            ReactEvent::Reply { text } => {
                if streamed.trim() != text.trim() {
                    if !streamed.is_empty() {
                        println!();
                    }
                    print!("{}", text);
                }
            }
            ReactEvent::ToolCall { tool, .. } => tracing::debug!(tool = %tool, "tool call"),
            ReactEvent::MessageDone => {
                println!();
                break;
            }
            _ => {}
        }
    }
}
