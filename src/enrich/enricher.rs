//! ResponseEnricher：尽力而为地给合法结果附加疗法库匹配
//!
//! 从 concern 中抽取关键词并发检索，整体受超时约束；按 id 去重、截断到 max_matches。
//! 任何失败（超时、库不可用、数据损坏）都只记 warn，结果原样返回，不附加注解。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::core::PipelineError;
use crate::enrich::{Remedy, RemedyRepository};

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "also", "been", "before", "being", "could", "days", "does",
    "every", "feel", "feeling", "from", "have", "having", "into", "just", "like", "lately",
    "much", "need", "really", "some", "something", "that", "them", "then", "there", "these",
    "they", "this", "very", "want", "what", "when", "where", "which", "while", "with",
    "would", "your",
];

/// 从 concern 中抽取检索关键词：长度 ≥ 4、非停用词、按出现顺序去重
pub fn extract_keywords(concern: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    concern
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4 && !STOP_WORDS.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}

/// 增强步骤
#[derive(Clone)]
pub struct ResponseEnricher {
    repository: Arc<dyn RemedyRepository>,
    timeout: Duration,
    max_matches: usize,
}

impl ResponseEnricher {
    pub fn new(repository: Arc<dyn RemedyRepository>, timeout: Duration, max_matches: usize) -> Self {
        Self {
            repository,
            timeout,
            max_matches,
        }
    }

    pub fn enabled(&self) -> bool {
        self.repository.enabled() && self.max_matches > 0
    }

    /// 检索匹配；空结果返回 Ok(vec![])，调用方据此决定是否附加注解
    pub async fn find_matches(&self, concern: &str) -> Result<Vec<Remedy>, PipelineError> {
        if !self.enabled() {
            return Ok(Vec::new());
        }
        let keywords = extract_keywords(concern);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        debug!(keywords = keywords.len(), "Searching remedy repository");

        let searches = keywords
            .iter()
            .map(|k| self.repository.search_remedies(k));
        let results = tokio::time::timeout(self.timeout, join_all(searches))
            .await
            .map_err(|_| {
                PipelineError::EnrichmentFailure(format!(
                    "repository search timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?;

        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        for result in results {
            let remedies = result.map_err(|e| PipelineError::EnrichmentFailure(e.to_string()))?;
            for remedy in remedies {
                if matches.len() >= self.max_matches {
                    break;
                }
                if seen.insert(remedy.id.clone()) {
                    matches.push(remedy);
                }
            }
        }
        Ok(matches)
    }

    /// 尽力而为的增强：返回匹配列表，失败时返回 None 并记录错误
    pub async fn enrich(&self, concern: &str) -> (Option<Vec<Remedy>>, Option<PipelineError>) {
        match self.find_matches(concern).await {
            Ok(matches) if matches.is_empty() => (None, None),
            Ok(matches) => (Some(matches), None),
            Err(e) => {
                warn!(error = %e, "Enrichment skipped");
                (None, Some(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{InMemoryRemedyRepository, NoopRemedyRepository, RepositoryError};
    use async_trait::async_trait;

    fn remedy(id: &str, name: &str) -> Remedy {
        Remedy {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: None,
            ingredients: Vec::new(),
            benefits: Vec::new(),
        }
    }

    struct BrokenRepository;

    #[async_trait]
    impl RemedyRepository for BrokenRepository {
        async fn search_remedies(&self, _query: &str) -> Result<Vec<Remedy>, RepositoryError> {
            Err(RepositoryError::Unavailable("index offline".into()))
        }
    }

    #[test]
    fn test_extract_keywords_drops_short_and_stop_words() {
        assert_eq!(
            extract_keywords("I have a Headache and feel tired, headache again"),
            vec!["headache", "tired"]
        );
    }

    #[tokio::test]
    async fn test_matches_deduplicated_and_capped() {
        let repo = InMemoryRemedyRepository::new(vec![
            remedy("1", "Ginger headache tea"),
            remedy("2", "Peppermint headache balm"),
            remedy("3", "Ginger chews"),
        ]);
        let enricher = ResponseEnricher::new(Arc::new(repo), Duration::from_secs(1), 2);
        let matches = enricher.find_matches("ginger for headache").await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_repository_failure_is_swallowed() {
        let enricher = ResponseEnricher::new(Arc::new(BrokenRepository), Duration::from_secs(1), 5);
        let (matches, err) = enricher.enrich("bloating after meals").await;
        assert!(matches.is_none());
        assert!(matches!(err, Some(PipelineError::EnrichmentFailure(_))));
    }

    #[tokio::test]
    async fn test_noop_repository_disables_enrichment() {
        let enricher = ResponseEnricher::new(Arc::new(NoopRemedyRepository), Duration::from_secs(1), 5);
        assert!(!enricher.enabled());
        assert_eq!(enricher.enrich("bloating").await.0, None);
    }
}
