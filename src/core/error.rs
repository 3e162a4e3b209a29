//! 流水线错误类型与阶段动作
//!
//! 与 RecoveryEngine 配合：除领域拒绝外，所有错误都在流水线内部消化，不会抛给 HTTP 调用方。

use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;

/// 流水线运行中可能出现的错误
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 输入不在健康领域内；面向用户的拒绝，不是系统错误
    #[error("input rejected by health topic gate")]
    ClassificationRejected,

    /// 凭据缺失或客户端未构造
    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// 网络、超时、限流、非 2xx、取消
    #[error("provider {provider} failed: {source}")]
    ProviderTransient {
        provider: String,
        #[source]
        source: LlmError,
    },

    /// 返回了无法解析或缺少必填字段的输出
    #[error("provider {provider} violated {contract} contract: {reason}")]
    ProviderSchemaViolation {
        provider: String,
        contract: &'static str,
        reason: String,
    },

    #[error("enrichment failed: {0}")]
    EnrichmentFailure(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ClassificationRejected => ErrorKind::ClassificationRejected,
            PipelineError::ProviderUnavailable { .. } => ErrorKind::ProviderUnavailable,
            PipelineError::ProviderTransient { .. } => ErrorKind::ProviderTransientError,
            PipelineError::ProviderSchemaViolation { .. } => ErrorKind::ProviderSchemaViolation,
            PipelineError::EnrichmentFailure(_) => ErrorKind::EnrichmentFailure,
        }
    }

    /// Provider 调用返回的 LlmError 一律按瞬时错误处理；未配置的槽位由编排器直接构造 ProviderUnavailable
    pub fn from_llm(provider: &str, err: LlmError) -> Self {
        PipelineError::ProviderTransient {
            provider: provider.to_string(),
            source: err,
        }
    }
}

/// 轨迹中记录的错误种类
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ClassificationRejected,
    ProviderUnavailable,
    ProviderTransientError,
    ProviderSchemaViolation,
    EnrichmentFailure,
}

/// 恢复引擎根据错误类型给出的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageAction {
    /// 返回固定拒绝文案，终止
    Refuse,
    /// 进入下一阶段（下一个 Provider 或兜底）
    Advance,
    /// 增强失败：省略 database_remedies，结果不变
    OmitAnnotation,
}
