//! 结果增强：外部疗法库协作方与 ResponseEnricher

pub mod enricher;
pub mod repository;

pub use enricher::{extract_keywords, ResponseEnricher};
pub use repository::{
    InMemoryRemedyRepository, NoopRemedyRepository, Remedy, RemedyRepository, RepositoryError,
};
