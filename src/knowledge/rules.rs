//! 知识检索规则：探索步骤中用户询问「有哪些 / 什么是 / 解释」类问题时，推理前强制检索知识库

use crate::knowledge::tokenizer::tokenize;
use crate::progress::steps::is_interview_step;

/// 中文关键词按子串匹配
pub const MUST_QUERY_KEYWORDS: &[&str] = &[
    "有哪些", "列举", "选项", "什么是", "解释", "介绍", "多少种", "几种", "有什么", "能选", "怎么选",
];

/// 英文关键词按完整词（或连续词组）匹配，避免 "listen" 命中 "list"
pub const MUST_QUERY_PHRASES: &[&str] = &[
    "what is", "what are", "list", "options", "explain", "examples of",
];

/// 是否需要在推理前预取知识片段
pub fn should_force_knowledge_query(step_id: &str, user_input: &str) -> bool {
    if !is_interview_step(step_id) {
        return false;
    }
    let lower = user_input.to_lowercase();
    if MUST_QUERY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }
    let tokens = tokenize(&lower);
    MUST_QUERY_PHRASES.iter().any(|phrase| contains_phrase(&tokens, phrase))
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    !words.is_empty()
        && tokens
            .windows(words.len())
            .any(|w| w.iter().zip(&words).all(|(t, p)| t == p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_fires_only_on_interview_steps() {
        assert!(should_force_knowledge_query("values_exploration", "价值观有哪些？"));
        assert!(should_force_knowledge_query("strengths_exploration", "What are the options?"));
        assert!(!should_force_knowledge_query("combination", "价值观有哪些？"));
        assert!(!should_force_knowledge_query("values_exploration", "我喜欢帮助别人"));
    }

    #[test]
    fn test_english_keywords_match_whole_words() {
        assert!(!should_force_knowledge_query("interests_exploration", "I like to listen to music"));
        assert!(!should_force_knowledge_query("values_exploration", "Whatever, it is fine"));
        assert!(should_force_knowledge_query("interests_exploration", "Can you list the options"));
        assert!(should_force_knowledge_query("values_exploration", "Explain, please."));
        assert!(should_force_knowledge_query("values_exploration", "Show me examples of values"));
    }
}
