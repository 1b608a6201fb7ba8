//! 答题卡：题目回答充分后生成的结构化总结
//!
//! 合成调用模型生成 {ai_summary, ai_analysis, key_insights}；任何失败都回退到
//! 最近三条用户发言的朴素拼接，不影响本轮对用户的回复。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::{recent_user_messages, render_transcript, Message};
use crate::progress::goals::QuestionGoal;
use crate::progress::steps::category_label;
use crate::react::decision::extract_json_block;

const CARD_TEMPERATURE: f32 = 0.5;
const FALLBACK_SUMMARY_CHARS: usize = 100;
const MAX_INSIGHTS: usize = 5;

/// 输出给前端的答题卡
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnswerCard {
    pub question_step: String,
    #[serde(default)]
    pub question_id: Option<u32>,
    #[serde(default)]
    pub question_content: Option<String>,
    pub user_answer: String,
    #[serde(default)]
    pub ai_summary: String,
    #[serde(default)]
    pub ai_analysis: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    /// 只有回答充分性判定触发的答题卡才为 true
    #[serde(default)]
    pub should_show: bool,
}

/// 模型返回的分析部分
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardAnalysis {
    #[serde(default)]
    pub ai_summary: String,
    #[serde(default)]
    pub ai_analysis: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
}

/// 朴素提取：最近三条用户发言以空格拼接
pub fn extract_user_answer(conversation: &[Message]) -> String {
    recent_user_messages(conversation, 3)
        .into_iter()
        .map(|m| m.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn fallback_analysis(conversation: &[Message]) -> CardAnalysis {
    let answer = extract_user_answer(conversation);
    CardAnalysis {
        ai_summary: answer.chars().take(FALLBACK_SUMMARY_CHARS).collect(),
        ai_analysis: String::new(),
        key_insights: Vec::new(),
    }
}

const CARD_PROMPT: &str = "你是一位专业的职业咨询师，正在为用户生成一张答题卡。\n\
类别：{category}\n题目：{question}\n本题目标：{goal}\n\n对话记录：\n{conversation}\n\n\
请只返回 JSON：{\"ai_summary\": \"1-2 句核心观点\", \"ai_analysis\": \"深层分析\", \"key_insights\": [\"3-5 个关键洞察短语\"]}";

/// 答题卡合成器
pub struct CardSynthesizer {
    llm: Arc<dyn LlmClient>,
    temperature: f32,
}

impl CardSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            temperature: CARD_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn try_synthesize(
        &self,
        category: &str,
        question: &str,
        goal: &QuestionGoal,
        conversation: &[Message],
    ) -> Result<CardAnalysis, AgentError> {
        let prompt = CARD_PROMPT
            .replace("{category}", category_label(category))
            .replace("{question}", question)
            .replace("{goal}", &goal.goal)
            .replace("{conversation}", &render_transcript(conversation));
        let messages = [Message::system(prompt), Message::user("请生成答题卡总结。")];
        let raw = self
            .llm
            .chat(&messages, self.temperature)
            .await
            .map_err(|e| AgentError::SufficiencyAnalysis(e.to_string()))?;
        let json = extract_json_block(&raw)
            .ok_or_else(|| AgentError::SufficiencyAnalysis("no JSON in card output".into()))?;
        let mut analysis: CardAnalysis = serde_json::from_str(json)
            .map_err(|e| AgentError::SufficiencyAnalysis(e.to_string()))?;
        analysis.key_insights.retain(|s| !s.trim().is_empty());
        analysis.key_insights.truncate(MAX_INSIGHTS);
        Ok(analysis)
    }

    /// 生成分析；失败时记录 warn 并回退，永不返回错误
    pub async fn synthesize(
        &self,
        category: &str,
        question: &str,
        goal: &QuestionGoal,
        conversation: &[Message],
    ) -> CardAnalysis {
        match self.try_synthesize(category, question, goal, conversation).await {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(error = %e, "answer card synthesis failed, using naive summary");
                fallback_analysis(conversation)
            }
        }
    }
}
