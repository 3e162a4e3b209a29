//! 编排器：领域门控 → 主 Provider → 次 Provider → 确定性兜底 → 增强
//!
//! Orchestrator 持有进程级共享依赖（分类器、Provider、增强器），启动时构造一次；
//! 每个请求创建一个 PipelineRun，状态只前进不回退，同一时刻最多一个 Provider 调用在途。
//! 除领域拒绝外，任何错误都在运行内部消化，调用方总能拿到一个满足契约的结果。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::classifier::{HealthTopicClassifier, REFUSAL_MESSAGE};
use crate::core::{
    AiSource, AttemptRecord, PipelineError, PipelineStage, PipelineTrace, RecoveryEngine,
    StageAction,
};
use crate::enrich::ResponseEnricher;
use crate::llm::{LlmError, ProviderAdapter};
use crate::remedy::{contract_schema, parse_candidate, Contract, Message};

/// 一次运行的结果：领域拒绝（固定文案）或满足契约的答案
#[derive(Debug)]
pub enum Reply<T> {
    Refused(&'static str),
    Answered { result: T, trace: PipelineTrace },
}

impl<T> Reply<T> {
    pub fn is_refused(&self) -> bool {
        matches!(self, Reply::Refused(_))
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            Reply::Answered { result, .. } => Some(result),
            Reply::Refused(_) => None,
        }
    }

    pub fn trace(&self) -> Option<&PipelineTrace> {
        match self {
            Reply::Answered { trace, .. } => Some(trace),
            Reply::Refused(_) => None,
        }
    }
}

/// 对外只序列化载荷：拒绝时是字符串本身，否则是结果对象（轨迹不外发）
impl<T: Serialize> Serialize for Reply<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reply::Refused(message) => serializer.serialize_str(message),
            Reply::Answered { result, .. } => result.serialize(serializer),
        }
    }
}

/// 进程级共享的编排依赖
pub struct Orchestrator {
    classifier: HealthTopicClassifier,
    primary: Option<Arc<dyn ProviderAdapter>>,
    secondary: Option<Arc<dyn ProviderAdapter>>,
    enricher: Option<ResponseEnricher>,
    recovery: RecoveryEngine,
    request_timeout: Duration,
    max_response_chars: usize,
}

impl Orchestrator {
    pub fn new(
        primary: Option<Arc<dyn ProviderAdapter>>,
        secondary: Option<Arc<dyn ProviderAdapter>>,
        enricher: Option<ResponseEnricher>,
        request_timeout: Duration,
        max_response_chars: usize,
    ) -> Self {
        Self {
            classifier: HealthTopicClassifier::new(),
            primary,
            secondary,
            enricher,
            recovery: RecoveryEngine::new(),
            request_timeout,
            max_response_chars,
        }
    }

    /// 已配置的 Provider id（按尝试顺序）
    pub fn provider_ids(&self) -> Vec<&str> {
        [&self.primary, &self.secondary]
            .into_iter()
            .flatten()
            .map(|p| p.id())
            .collect()
    }

    /// 跑一次完整流水线；concern 决定门控与兜底，messages 是发给 Provider 的 Prompt
    pub async fn run<T: Contract>(
        &self,
        concern: &str,
        preferences: Option<&str>,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> Reply<T> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("pipeline", run_id = %run_id, contract = T::NAME);
        let run = PipelineRun {
            orchestrator: self,
            trace: PipelineTrace::new(run_id),
            cancel,
        };
        run.execute::<T>(concern, preferences, messages)
            .instrument(span)
            .await
    }
}

/// 单次请求的状态机
struct PipelineRun<'a> {
    orchestrator: &'a Orchestrator,
    trace: PipelineTrace,
    cancel: &'a CancellationToken,
}

impl PipelineRun<'_> {
    fn advance(&mut self, next: PipelineStage) {
        let from = self.trace.current();
        debug_assert!(from.can_advance_to(next), "illegal transition {from:?} -> {next:?}");
        debug!(from = ?from, to = ?next, "Stage transition");
        self.trace.stages.push(next);
    }

    fn record(&mut self, provider_id: &str, error: Option<&PipelineError>) {
        self.trace.attempts.push(AttemptRecord {
            provider_id: provider_id.to_string(),
            success: error.is_none(),
            error: error.map(PipelineError::kind),
            at: Utc::now(),
        });
    }

    async fn execute<T: Contract>(
        mut self,
        concern: &str,
        preferences: Option<&str>,
        messages: &[Message],
    ) -> Reply<T> {
        let orch = self.orchestrator;
        self.advance(PipelineStage::Gate);
        match orch.classifier.matched_theme(concern) {
            Some(theme) => debug!(theme, "Input accepted by health gate"),
            None => {
                let action = orch.recovery.handle(&PipelineError::ClassificationRejected);
                info!(action = ?action, "Input outside health domain, refusing");
                self.advance(PipelineStage::Done);
                return Reply::Refused(REFUSAL_MESSAGE);
            }
        }

        let schema = contract_schema::<T>();
        let slots = [
            (PipelineStage::TryA, "primary", orch.primary.clone(), AiSource::Primary),
            (PipelineStage::TryB, "secondary", orch.secondary.clone(), AiSource::Secondary),
        ];

        let mut answer: Option<T> = None;
        for (stage, slot, provider, source) in slots {
            self.advance(stage);
            if self.cancel.is_cancelled() {
                debug!(slot, "Run cancelled, skipping provider");
                continue;
            }
            let provider_id = provider
                .as_ref()
                .map(|p| p.id().to_string())
                .unwrap_or_else(|| slot.to_string());
            match self.attempt::<T>(provider, &provider_id, messages, &schema).await {
                Ok(mut result) => {
                    info!(provider = %provider_id, "Provider answered");
                    self.record(&provider_id, None);
                    result.set_ai_source(source);
                    answer = Some(result);
                    break;
                }
                Err(err) => {
                    warn!(provider = %provider_id, kind = ?err.kind(), error = %err, "Provider attempt failed");
                    self.record(&provider_id, Some(&err));
                    match orch.recovery.handle(&err) {
                        StageAction::Advance => continue,
                        other => debug!(action = ?other, "Unexpected provider action, advancing"),
                    }
                }
            }
        }

        let mut result = match answer {
            Some(result) => result,
            None => {
                self.advance(PipelineStage::Fallback);
                info!(
                    rule = crate::remedy::fallback::matched_rule_name(concern),
                    "Using deterministic fallback"
                );
                let mut result = T::fallback(concern, preferences);
                result.set_ai_source(AiSource::PatternAnalysis);
                result
            }
        };

        self.advance(PipelineStage::Enrich);
        if let Some(enricher) = orch.enricher.as_ref().filter(|_| !self.cancel.is_cancelled()) {
            let (matches, err) = enricher.enrich(concern).await;
            if let Some(matches) = matches {
                debug!(count = matches.len(), "Attached database remedies");
                result.attach_database_remedies(matches);
            }
            if let Some(err) = err {
                if orch.recovery.handle(&err) == StageAction::OmitAnnotation {
                    self.trace.enrichment_error = Some(err.kind());
                }
            }
        }

        self.advance(PipelineStage::Done);
        Reply::Answered {
            result,
            trace: self.trace,
        }
    }

    /// 单次 Provider 尝试：超时、取消、长度上限、契约校验
    async fn attempt<T: Contract>(
        &self,
        provider: Option<Arc<dyn ProviderAdapter>>,
        provider_id: &str,
        messages: &[Message],
        schema: &Value,
    ) -> Result<T, PipelineError> {
        let orch = self.orchestrator;
        let Some(provider) = provider else {
            return Err(PipelineError::ProviderUnavailable {
                provider: provider_id.to_string(),
                reason: "not configured".to_string(),
            });
        };

        let call = tokio::time::timeout(orch.request_timeout, provider.generate(messages, Some(schema)));
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(LlmError::Cancelled),
            r = call => r.unwrap_or(Err(LlmError::Timeout(orch.request_timeout))),
        };
        let raw = outcome.map_err(|e| PipelineError::from_llm(provider_id, e))?;
        let (prompt_tokens, completion_tokens, _) = provider.token_usage();
        debug!(prompt_tokens, completion_tokens, "Cumulative provider token usage");

        let len = raw.chars().count();
        if len > orch.max_response_chars {
            return Err(PipelineError::from_llm(
                provider_id,
                LlmError::ResponseTooLarge {
                    len,
                    limit: orch.max_response_chars,
                },
            ));
        }

        parse_candidate::<T>(&raw).map_err(|violation| PipelineError::ProviderSchemaViolation {
            provider: provider_id.to_string(),
            contract: T::NAME,
            reason: violation.to_string(),
        })
    }
}
