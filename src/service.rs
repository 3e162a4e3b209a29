//! 对外操作：generate_remedy / analyze_symptoms
//!
//! 两个操作共用同一个 Orchestrator；问诊只把最新一条 User 消息交给门控与兜底，
//! 更早的轮次按 max_history_turns 截断后作为 Prompt 上下文。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::{Orchestrator, OrchestratorBuilder, Reply};
use crate::remedy::{
    remedy_messages, symptom_messages, GeneratedRemedy, RemedyRequest, SymptomAnalysisResult,
    SymptomQuery,
};

/// 疗法服务：可在多个请求间共享（内部只有只读依赖）
#[derive(Clone)]
pub struct RemedyService {
    orchestrator: Arc<Orchestrator>,
    max_history_turns: usize,
}

impl RemedyService {
    pub fn new(orchestrator: Arc<Orchestrator>, max_history_turns: usize) -> Self {
        Self {
            orchestrator,
            max_history_turns,
        }
    }

    /// 按配置构造：Provider 从环境变量读取凭据
    pub fn from_config(config: AppConfig) -> Self {
        let max_history_turns = config.app.max_history_turns;
        let orchestrator = OrchestratorBuilder::new(config)
            .with_providers_from_config()
            .build();
        Self::new(Arc::new(orchestrator), max_history_turns)
    }

    /// 为某个健康问题生成一份疗法
    pub async fn generate_remedy(&self, request: &RemedyRequest) -> Reply<GeneratedRemedy> {
        self.generate_remedy_with_cancel(request, &CancellationToken::new())
            .await
    }

    pub async fn generate_remedy_with_cancel(
        &self,
        request: &RemedyRequest,
        cancel: &CancellationToken,
    ) -> Reply<GeneratedRemedy> {
        let messages = remedy_messages(request);
        self.orchestrator
            .run(
                &request.health_concern,
                request.preferences.as_deref(),
                &messages,
                cancel,
            )
            .await
    }

    /// 对话式症状分析
    pub async fn analyze_symptoms(&self, query: &SymptomQuery) -> Reply<SymptomAnalysisResult> {
        self.analyze_symptoms_with_cancel(query, &CancellationToken::new())
            .await
    }

    pub async fn analyze_symptoms_with_cancel(
        &self,
        query: &SymptomQuery,
        cancel: &CancellationToken,
    ) -> Reply<SymptomAnalysisResult> {
        let messages = symptom_messages(query, self.max_history_turns);
        self.orchestrator
            .run(query.latest_concern(), None, &messages, cancel)
            .await
    }
}
