//! 核心编排层：错误与恢复、状态与轨迹、编排器与构建器

pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod recovery;
pub mod state;

pub use builder::{create_providers_from_config, OrchestratorBuilder, ProviderPair};
pub use error::{ErrorKind, PipelineError, StageAction};
pub use orchestrator::{Orchestrator, Reply};
pub use recovery::RecoveryEngine;
pub use state::{AiSource, AttemptRecord, PipelineStage, PipelineTrace};
