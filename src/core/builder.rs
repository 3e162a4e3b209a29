//! 编排器构建器：进程启动时按配置构造一次 Provider 与增强器
//!
//! CLI、Web 与测试共用同一套初始化逻辑；测试可直接注入 Mock Provider 与疗法库。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::Orchestrator;
use crate::enrich::{InMemoryRemedyRepository, NoopRemedyRepository, RemedyRepository, ResponseEnricher};
use crate::llm::{create_gemini_client, create_openai_client, ProviderAdapter};

/// 主 / 次 Provider
pub type ProviderPair = (
    Option<Arc<dyn ProviderAdapter>>,
    Option<Arc<dyn ProviderAdapter>>,
);

/// 根据配置与环境变量创建两个 Provider；缺少凭据的一侧为 None
pub fn create_providers_from_config(cfg: &AppConfig) -> ProviderPair {
    let limits = cfg.llm.limits();
    let primary = create_openai_client(&cfg.llm.openai, limits).map(|c| {
        tracing::info!("Using OpenAI provider ({})", cfg.llm.openai.model);
        Arc::new(c) as Arc<dyn ProviderAdapter>
    });
    let secondary = create_gemini_client(&cfg.llm.gemini, limits, cfg.llm.request_timeout()).map(|c| {
        tracing::info!("Using Gemini provider ({})", cfg.llm.gemini.model);
        Arc::new(c) as Arc<dyn ProviderAdapter>
    });
    if primary.is_none() && secondary.is_none() {
        tracing::warn!("No provider credentials set, every answer will come from the deterministic fallback");
    }
    (primary, secondary)
}

/// 编排器构建器
pub struct OrchestratorBuilder {
    config: AppConfig,
    primary: Option<Arc<dyn ProviderAdapter>>,
    secondary: Option<Arc<dyn ProviderAdapter>>,
    repository: Option<Arc<dyn RemedyRepository>>,
}

impl OrchestratorBuilder {
    /// 创建新的构建器（不含 Provider，需显式设置或从配置加载）
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            primary: None,
            secondary: None,
            repository: None,
        }
    }

    /// 从配置与环境变量创建 Provider
    pub fn with_providers_from_config(mut self) -> Self {
        let (primary, secondary) = create_providers_from_config(&self.config);
        self.primary = primary;
        self.secondary = secondary;
        self
    }

    pub fn with_primary(mut self, provider: Arc<dyn ProviderAdapter>) -> Self {
        self.primary = Some(provider);
        self
    }

    pub fn with_secondary(mut self, provider: Arc<dyn ProviderAdapter>) -> Self {
        self.secondary = Some(provider);
        self
    }

    /// 指定疗法库（覆盖配置中的 catalog_path）
    pub fn with_repository(mut self, repository: Arc<dyn RemedyRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// 构建疗法库：显式注入优先，其次 catalog_path，目录加载失败时退化为空实现
    fn build_repository(&self) -> Arc<dyn RemedyRepository> {
        if let Some(repo) = &self.repository {
            return repo.clone();
        }
        match &self.config.enrichment.catalog_path {
            Some(path) => match InMemoryRemedyRepository::from_json_file(path) {
                Ok(repo) => {
                    tracing::info!(path = %path.display(), entries = repo.len(), "Loaded remedy catalog");
                    Arc::new(repo)
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Remedy catalog unavailable ({}), enrichment disabled", e);
                    Arc::new(NoopRemedyRepository)
                }
            },
            None => Arc::new(NoopRemedyRepository),
        }
    }

    /// 构建增强器；配置关闭或没有可用疗法库时为 None
    pub fn build_enricher(&self) -> Option<ResponseEnricher> {
        if !self.config.enrichment.enabled {
            return None;
        }
        let enricher = ResponseEnricher::new(
            self.build_repository(),
            self.config.enrichment.timeout(),
            self.config.enrichment.max_matches,
        );
        enricher.enabled().then_some(enricher)
    }

    pub fn build(self) -> Orchestrator {
        let enricher = self.build_enricher();
        Orchestrator::new(
            self.primary,
            self.secondary,
            enricher,
            self.config.llm.request_timeout(),
            self.config.llm.max_response_chars,
        )
    }

    /// 获取配置
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::Remedy;
    use crate::llm::MockProvider;

    #[test]
    fn test_enricher_disabled_without_catalog() {
        let builder = OrchestratorBuilder::new(AppConfig::default());
        assert!(builder.build_enricher().is_none());
    }

    #[test]
    fn test_enricher_uses_injected_repository() {
        let repo = InMemoryRemedyRepository::new(vec![Remedy {
            id: "1".into(),
            name: "Chamomile Tea".into(),
            description: String::new(),
            category: None,
            ingredients: Vec::new(),
            benefits: Vec::new(),
        }]);
        let builder = OrchestratorBuilder::new(AppConfig::default()).with_repository(Arc::new(repo));
        assert!(builder.build_enricher().is_some());
    }

    #[test]
    fn test_missing_catalog_file_disables_enrichment() {
        let mut cfg = AppConfig::default();
        cfg.enrichment.catalog_path = Some("/nonexistent/catalog.json".into());
        assert!(OrchestratorBuilder::new(cfg).build_enricher().is_none());
    }

    #[test]
    fn test_build_with_injected_providers() {
        let orch = OrchestratorBuilder::new(AppConfig::default())
            .with_primary(Arc::new(MockProvider::failing("a")))
            .with_secondary(Arc::new(MockProvider::failing("b")))
            .build();
        assert_eq!(orch.provider_ids(), vec!["a", "b"]);
    }
}
