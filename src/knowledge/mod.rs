//! 知识层：内容加载、知识库检索、分词与强制检索规则

pub mod base;
pub mod loader;
pub mod rules;
pub mod tokenizer;

pub use base::{InterestItem, KnowledgeBase, QuestionItem, SearchHit, StrengthItem, ValueItem};
pub use loader::{ContentFile, ContentLoader, StaticContentLoader};
pub use rules::should_force_knowledge_query;
