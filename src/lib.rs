//! Remedy AI - 健康问答 AI 编排层
//!
//! 模块划分：
//! - **classifier**: 领域门控（健康话题判定与固定拒绝文案）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 流水线状态机、错误与恢复、编排器构建
//! - **enrich**: 外部疗法库协作方与结果增强
//! - **llm**: Provider 适配器抽象与实现（OpenAI / Gemini / Mock）
//! - **observability**: tracing 日志初始化
//! - **remedy**: 请求与输出契约、Prompt、契约校验、确定性兜底
//! - **service**: 对外操作 generate_remedy / analyze_symptoms

pub mod classifier;
pub mod config;
pub mod core;
pub mod enrich;
pub mod llm;
pub mod observability;
pub mod remedy;
pub mod service;

pub use classifier::{HealthTopicClassifier, REFUSAL_MESSAGE};
pub use core::{Orchestrator, OrchestratorBuilder, Reply};
pub use service::RemedyService;
