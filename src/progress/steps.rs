//! 访谈步骤目录：步骤 id、对应题库类别、步骤介绍与题目引导语

pub const VALUES_EXPLORATION: &str = "values_exploration";
pub const STRENGTHS_EXPLORATION: &str = "strengths_exploration";
pub const INTERESTS_EXPLORATION: &str = "interests_exploration";
pub const COMBINATION: &str = "combination";
pub const REFINEMENT: &str = "refinement";

pub const DEFAULT_CURRENT_STEP: &str = VALUES_EXPLORATION;

/// 步骤顺序：价值观 → 才能 → 兴趣 → 综合
pub const STEP_ORDER: [&str; 5] = [
    VALUES_EXPLORATION,
    STRENGTHS_EXPLORATION,
    INTERESTS_EXPLORATION,
    COMBINATION,
    REFINEMENT,
];

/// 访谈类步骤对应的题库类别；综合类步骤没有题目
pub fn category_for_step(step_id: &str) -> Option<&'static str> {
    match step_id {
        VALUES_EXPLORATION | "values" => Some("values"),
        STRENGTHS_EXPLORATION | "strengths" => Some("strengths"),
        INTERESTS_EXPLORATION | "interests" => Some("interests"),
        _ => None,
    }
}

pub fn is_interview_step(step_id: &str) -> bool {
    category_for_step(step_id).is_some()
}

pub fn category_label(category: &str) -> &str {
    match category {
        "values" => "价值观",
        "strengths" => "才能",
        "interests" => "兴趣与热情",
        other => other,
    }
}

pub struct StepTheory {
    pub purpose: &'static str,
    pub theory: &'static str,
}

pub fn step_theory(step_id: &str) -> StepTheory {
    match category_for_step(step_id) {
        Some("values") => StepTheory {
            purpose: "探索你内心真正看重的价值观",
            theory: "价值观是指引人生方向的核心信念。通过探索价值观，我们能够明确什么对你来说真正重要，\
                     理解你做决策时的内在驱动力，找到让你感到有意义的人生方向。\
                     价值观探索不是寻找\"正确答案\"，而是发现你内心真实的声音。",
        },
        Some("strengths") => StepTheory {
            purpose: "发现你的天赋优势和核心能力",
            theory: "才能是你天生擅长且容易做好的事情。探索才能可以帮助你识别天赋优势领域，\
                     了解你能在哪些方面出类拔萃，找到能发挥优势的职业方向。\
                     真正的才能往往表现为：做这件事时感到轻松、自然，且能比他人做得更好。",
        },
        Some("interests") => StepTheory {
            purpose: "探索你内心真正感兴趣和充满热情的事物",
            theory: "热情是驱动你持续投入的内在动力。探索热情能够发现让你充满活力的事物，\
                     识别你愿意长期投入的方向，找到工作与乐趣结合的可能性。\
                     热情的标志是：即使遇到困难，你仍然愿意继续，并从中获得满足感。",
        },
        _ => StepTheory {
            purpose: "探索这个主题",
            theory: "让我们开始这个阶段的探索。",
        },
    }
}

/// 步骤介绍（每个步骤只展示一次）
pub fn render_step_intro(step_id: &str) -> String {
    let t = step_theory(step_id);
    format!("【{}】\n{}", t.purpose, t.theory)
}

/// 题目开始时的引导语
pub fn question_guidance(category: &str) -> &'static str {
    match category {
        "values" => "让我们来探索一下这个关于价值观的问题。请根据你的真实想法回答，不必考虑社会期待或他人看法。",
        "strengths" => "现在让我们聊聊你的才能和优势。请分享你在这方面的真实体验和感受。",
        "interests" => "让我们谈谈你的兴趣和热情。请告诉我，什么事情能让你感到充满活力？",
        _ => "让我们开始这道题的探索。",
    }
}

/// 下一个步骤 id（已是最后一步时返回 None）
pub fn next_step(step_id: &str) -> Option<&'static str> {
    let pos = STEP_ORDER.iter().position(|s| *s == step_id)?;
    STEP_ORDER.get(pos + 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_for_step_accepts_short_ids() {
        assert_eq!(category_for_step("values"), Some("values"));
        assert_eq!(category_for_step(STRENGTHS_EXPLORATION), Some("strengths"));
        assert_eq!(category_for_step(COMBINATION), None);
        assert!(!is_interview_step(REFINEMENT));
    }

    #[test]
    fn test_next_step_order() {
        assert_eq!(next_step(VALUES_EXPLORATION), Some(STRENGTHS_EXPLORATION));
        assert_eq!(next_step(REFINEMENT), None);
        assert_eq!(next_step("unknown"), None);
    }

    #[test]
    fn test_intro_contains_purpose() {
        assert!(render_step_intro(INTERESTS_EXPLORATION).contains("热情"));
    }
}
