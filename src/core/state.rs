//! 状态定义：流水线阶段、来源标记与单次运行轨迹
//!
//! 每个请求一个 PipelineRun，状态只前进不回退：INIT → GATE → TRY_A → TRY_B → FALLBACK → ENRICH → DONE。
//! GATE 拒绝时直接进入 DONE。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::ErrorKind;

/// 流水线阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Init,
    Gate,
    TryA,
    TryB,
    Fallback,
    Enrich,
    Done,
}

impl PipelineStage {
    /// 合法的下一阶段；Gate 可直接到 Done（领域拒绝），Provider 阶段成功时跳到 Enrich
    pub fn can_advance_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Init, Gate)
                | (Gate, TryA)
                | (Gate, Done)
                | (TryA, TryB)
                | (TryA, Enrich)
                | (TryB, Fallback)
                | (TryB, Enrich)
                | (Fallback, Enrich)
                | (Enrich, Done)
        )
    }
}

/// 最终答案的来源（写入 ai_source）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AiSource {
    /// 主 Provider 成功（双 Provider 方案中的主路径）
    Primary,
    /// 仅次 Provider 成功
    Secondary,
    /// 确定性兜底
    PatternAnalysis,
}

impl AiSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiSource::Primary => "OpenAI + Gemini",
            AiSource::Secondary => "Gemini",
            AiSource::PatternAnalysis => "Pattern Analysis",
        }
    }
}

impl fmt::Display for AiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单次 Provider 尝试的记录
#[derive(Clone, Debug, Serialize)]
pub struct AttemptRecord {
    pub provider_id: String,
    pub success: bool,
    pub error: Option<ErrorKind>,
    pub at: DateTime<Utc>,
}

/// 单次运行轨迹：访问过的阶段与每次 Provider 尝试（仅供日志与测试，不返回给 HTTP 调用方）
#[derive(Clone, Debug, Serialize)]
pub struct PipelineTrace {
    pub run_id: String,
    pub stages: Vec<PipelineStage>,
    pub attempts: Vec<AttemptRecord>,
    pub enrichment_error: Option<ErrorKind>,
}

impl PipelineTrace {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            stages: vec![PipelineStage::Init],
            attempts: Vec::new(),
            enrichment_error: None,
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.stages.last().copied().unwrap_or(PipelineStage::Init)
    }

    pub fn visited(&self, stage: PipelineStage) -> bool {
        self.stages.contains(&stage)
    }

    /// 按顺序尝试过的 Provider id
    pub fn attempted_providers(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.provider_id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_transitions_only_move_forward() {
        use PipelineStage::*;
        assert!(Init.can_advance_to(Gate));
        assert!(Gate.can_advance_to(Done));
        assert!(TryA.can_advance_to(Enrich));
        assert!(!TryB.can_advance_to(TryA));
        assert!(!Fallback.can_advance_to(Done));
        assert!(!Done.can_advance_to(Init));
    }

    #[test]
    fn test_fallback_source_tag() {
        assert_eq!(AiSource::PatternAnalysis.to_string(), "Pattern Analysis");
    }

    #[test]
    fn test_stage_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&PipelineStage::TryA).unwrap(),
            "\"TRY_A\""
        );
    }
}
