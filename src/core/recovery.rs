//! 错误恢复引擎
//!
//! 根据 PipelineError 返回 StageAction，供 PipelineRun 决定是拒绝、推进到下一阶段还是省略增强注解。

use crate::core::{PipelineError, StageAction};

/// 将错误映射为可执行动作；Provider 失败一律推进，不做同 Provider 重试
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &PipelineError) -> StageAction {
        match err {
            PipelineError::ClassificationRejected => StageAction::Refuse,
            PipelineError::ProviderUnavailable { .. }
            | PipelineError::ProviderTransient { .. }
            | PipelineError::ProviderSchemaViolation { .. } => StageAction::Advance,
            PipelineError::EnrichmentFailure(_) => StageAction::OmitAnnotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    #[test]
    fn test_recovery_rejection_refuses() {
        let engine = RecoveryEngine::new();
        assert_eq!(
            engine.handle(&PipelineError::ClassificationRejected),
            StageAction::Refuse
        );
    }

    #[test]
    fn test_recovery_provider_errors_advance() {
        let engine = RecoveryEngine::new();
        let errors = [
            PipelineError::ProviderUnavailable {
                provider: "openai".into(),
                reason: "no key".into(),
            },
            PipelineError::ProviderTransient {
                provider: "openai".into(),
                source: LlmError::RateLimited { retry_after_ms: 1000 },
            },
            PipelineError::ProviderSchemaViolation {
                provider: "gemini".into(),
                contract: "GeneratedRemedy",
                reason: "missing field `name`".into(),
            },
        ];
        for err in &errors {
            assert_eq!(engine.handle(err), StageAction::Advance, "{err}");
        }
    }

    #[test]
    fn test_recovery_enrichment_omits_annotation() {
        let engine = RecoveryEngine::new();
        let err = PipelineError::EnrichmentFailure("index offline".into());
        assert_eq!(engine.handle(&err), StageAction::OmitAnnotation);
    }

    #[test]
    fn test_from_llm_is_transient() {
        let err = PipelineError::from_llm("gemini", LlmError::RateLimited { retry_after_ms: 1000 });
        assert_eq!(err.kind(), crate::core::ErrorKind::ProviderTransientError);

        let err = PipelineError::from_llm("gemini", LlmError::EmptyResponse);
        assert_eq!(err.kind(), crate::core::ErrorKind::ProviderTransientError);
    }
}
