//! 外部疗法库协作方：只读的关键词检索
//!
//! 核心层不拥有持久化；生产环境由存储层实现 RemedyRepository，
//! 这里提供内存实现（子串匹配，可从 JSON 目录文件加载）与空实现。

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 疗法库中的一条记录（仅读取检索需要的字段）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Remedy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
}

impl Remedy {
    /// 名称、描述、配料、功效任一包含 query（调用方负责小写化）
    fn matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
            || self
                .ingredients
                .iter()
                .chain(self.benefits.iter())
                .any(|s| s.to_lowercase().contains(query_lower))
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("remedy index unavailable: {0}")]
    Unavailable(String),
    #[error("malformed remedy data: {0}")]
    Malformed(String),
    #[error("catalog io: {0}")]
    Io(#[from] std::io::Error),
}

/// 疗法库 trait：按关键词检索
#[async_trait]
pub trait RemedyRepository: Send + Sync {
    async fn search_remedies(&self, query: &str) -> Result<Vec<Remedy>, RepositoryError>;

    /// 是否启用（Noop 实现返回 false，增强步骤会直接跳过）
    fn enabled(&self) -> bool {
        true
    }
}

/// 空实现：未配置疗法目录时使用
#[derive(Clone, Default)]
pub struct NoopRemedyRepository;

#[async_trait]
impl RemedyRepository for NoopRemedyRepository {
    async fn search_remedies(&self, _query: &str) -> Result<Vec<Remedy>, RepositoryError> {
        Ok(Vec::new())
    }

    fn enabled(&self) -> bool {
        false
    }
}

/// 内存实现：大小写不敏感的子串匹配
#[derive(Clone, Default)]
pub struct InMemoryRemedyRepository {
    remedies: Vec<Remedy>,
}

impl InMemoryRemedyRepository {
    pub fn new(remedies: Vec<Remedy>) -> Self {
        Self { remedies }
    }

    /// 从 JSON 数组文件加载目录
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let raw = std::fs::read_to_string(path)?;
        let remedies: Vec<Remedy> =
            serde_json::from_str(&raw).map_err(|e| RepositoryError::Malformed(e.to_string()))?;
        Ok(Self::new(remedies))
    }

    pub fn len(&self) -> usize {
        self.remedies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RemedyRepository for InMemoryRemedyRepository {
    async fn search_remedies(&self, query: &str) -> Result<Vec<Remedy>, RepositoryError> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .remedies
            .iter()
            .filter(|r| r.matches(&query))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ginger() -> Remedy {
        Remedy {
            id: "r1".into(),
            name: "Ginger Tea".into(),
            description: "Warming tea for digestion".into(),
            category: Some("tea".into()),
            ingredients: vec!["Fresh ginger".into(), "Honey".into()],
            benefits: vec!["Eases nausea".into()],
        }
    }

    #[tokio::test]
    async fn test_search_matches_any_field_case_insensitive() {
        let repo = InMemoryRemedyRepository::new(vec![ginger()]);
        assert_eq!(repo.search_remedies("GINGER").await.unwrap().len(), 1);
        assert_eq!(repo.search_remedies("digestion").await.unwrap().len(), 1);
        assert_eq!(repo.search_remedies("nausea").await.unwrap().len(), 1);
        assert!(repo.search_remedies("lavender").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_returns_nothing() {
        let repo = InMemoryRemedyRepository::new(vec![ginger()]);
        assert!(repo.search_remedies("   ").await.unwrap().is_empty());
    }

    #[test]
    fn test_from_json_file_rejects_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            InMemoryRemedyRepository::from_json_file(&path),
            Err(RepositoryError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_json_file_loads_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","name":"Chamomile Tea"},{"id":"b","name":"Turmeric Paste","ingredients":["turmeric"]}]"#,
        )
        .unwrap();
        let repo = InMemoryRemedyRepository::from_json_file(&path).unwrap();
        assert_eq!(repo.len(), 2);
    }
}
