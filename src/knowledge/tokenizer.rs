//! 分词
//!
//! 中英文混合分词，用于知识库关键词检索。
//! 使用 jieba-rs 进行中文分词，英文按空格分词。

use std::collections::HashSet;
use std::sync::OnceLock;

use jieba_rs::Jieba;

/// 全局 Jieba 实例（延迟初始化）
static JIEBA: OnceLock<Jieba> = OnceLock::new();

fn get_jieba() -> &'static Jieba {
    JIEBA.get_or_init(Jieba::new)
}

/// 检索时忽略的停用词
const STOP_WORDS: &[&str] = &[
    "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也",
    "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这", "什么",
    "哪些", "有哪些", "吗", "呢", "the", "and", "what", "are", "is", "of", "to", "me", "my",
];

/// 判断字符是否为 CJK（中日韩）字符
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' |   // CJK Unified Ideographs
        '\u{3400}'..='\u{4DBF}' |   // CJK Unified Ideographs Extension A
        '\u{F900}'..='\u{FAFF}' |   // CJK Compatibility Ideographs
        '\u{3040}'..='\u{309F}' |   // Hiragana
        '\u{30A0}'..='\u{30FF}'     // Katakana
    )
}

/// 判断文本是否包含 CJK 字符
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// 智能分词：包含 CJK 字符时用 jieba 搜索引擎模式，纯英文按空格与标点切分
pub fn tokenize(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if contains_cjk(text) {
        get_jieba()
            .cut_for_search(text, true)
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| s.len() > 1 || s.chars().next().map(is_cjk).unwrap_or(false))
            .filter(|s| s.chars().any(|c| c.is_alphanumeric()))
            .collect()
    } else {
        text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .map(|s| s.to_lowercase())
            .filter(|s| s.len() > 1)
            .collect()
    }
}

/// 分词并返回词集合
pub fn tokenize_to_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// 检索关键词：分词、去停用词、去重
pub fn keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// 匹配分数：关键词在文本中出现的比例（0-1）
pub fn match_score(text: &str, keywords: &[String]) -> f32 {
    if keywords.is_empty() || text.is_empty() {
        return 0.0;
    }
    let haystack = text.to_lowercase();
    let hits = keywords.iter().filter(|k| haystack.contains(k.as_str())).count();
    hits as f32 / keywords.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_chinese() {
        let tokens = tokenize("我喜欢编程和人工智能");
        assert!(!tokens.is_empty());
        assert!(tokens.iter().any(|t| t.contains("编程") || t.contains("人工") || t.contains("智能")));
    }

    #[test]
    fn test_tokenize_english_strips_punctuation() {
        let tokens = tokenize("Honesty, freedom and growth!");
        assert!(tokens.contains(&"honesty".to_string()));
        assert!(tokens.contains(&"growth".to_string()));
    }

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("你好"));
        assert!(contains_cjk("Hello 世界"));
        assert!(!contains_cjk("Hello World"));
    }

    #[test]
    fn test_keywords_drop_stop_words_and_dupes() {
        let kws = keywords("what is freedom and freedom");
        assert_eq!(kws, vec!["freedom".to_string()]);
    }

    #[test]
    fn test_match_score_fraction() {
        let kws = vec!["honesty".to_string(), "growth".to_string()];
        assert_eq!(match_score("Honesty matters", &kws), 0.5);
        assert_eq!(match_score("", &kws), 0.0);
        assert_eq!(match_score("anything", &[]), 0.0);
    }
}
