//! 疗法领域：请求与输出契约、对话轮次、契约校验、Schema 提示、Prompt 与确定性兜底

pub mod contract;
pub mod conversation;
pub mod fallback;
pub mod models;
pub mod prompt;
pub mod schema;

pub use contract::{extract_json, parse_candidate, Contract, SchemaViolation};
pub use conversation::{Message, Role, SymptomQuery};
pub use fallback::{remedy_fallback, symptom_fallback, FALLBACK_CONFIDENCE};
pub use models::{
    Confidence, GeneratedRemedy, NaturalRemedy, Recommendation, RemedyRequest,
    SymptomAnalysisResult,
};
pub use prompt::{remedy_messages, symptom_messages};
pub use schema::contract_schema;
