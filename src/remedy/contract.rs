//! 输出契约校验：Provider 原始文本 → 带标签的 Ok(契约对象) / Err(SchemaViolation)
//!
//! 先从文本中提取 JSON（```json 块或最外层 {...}），再用 serde 反序列化，最后检查必填字段非空。
//! 任何一步失败都视为 Provider 失败，部分合法的对象不会越过流水线。

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::core::AiSource;
use crate::enrich::Remedy;
use crate::remedy::fallback::{remedy_fallback, symptom_fallback};
use crate::remedy::{GeneratedRemedy, SymptomAnalysisResult};

/// 校验失败的原因
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("no JSON object in provider output")]
    NoJson,
    #[error("invalid JSON: {0}")]
    Parse(String),
    #[error("required field `{0}` is empty")]
    EmptyField(&'static str),
    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// 一种输出契约：可从 Provider 文本解析、可校验、可由确定性规则兜底生成
pub trait Contract: DeserializeOwned + Serialize + JsonSchema + Send + Sync + 'static {
    /// 契约名（日志与错误用）
    const NAME: &'static str;

    /// 检查契约不变量
    fn validate(&self) -> Result<(), SchemaViolation>;

    /// 确定性兜底：纯函数，输出按构造即合法
    fn fallback(concern: &str, preferences: Option<&str>) -> Self;

    fn set_ai_source(&mut self, source: AiSource);

    fn attach_database_remedies(&mut self, matches: Vec<Remedy>);
}

fn non_empty(field: &'static str, value: &str) -> Result<(), SchemaViolation> {
    if value.trim().is_empty() {
        Err(SchemaViolation::EmptyField(field))
    } else {
        Ok(())
    }
}

impl Contract for GeneratedRemedy {
    const NAME: &'static str = "GeneratedRemedy";

    fn validate(&self) -> Result<(), SchemaViolation> {
        non_empty("name", &self.name)?;
        non_empty("instructions", &self.instructions)?;
        if !self.ingredients.iter().any(|i| !i.trim().is_empty()) {
            return Err(SchemaViolation::EmptyField("ingredients"));
        }
        Ok(())
    }

    fn fallback(concern: &str, preferences: Option<&str>) -> Self {
        remedy_fallback(concern, preferences)
    }

    fn set_ai_source(&mut self, source: AiSource) {
        self.ai_source = Some(source.as_str().to_string());
    }

    fn attach_database_remedies(&mut self, matches: Vec<Remedy>) {
        self.database_remedies = Some(matches);
    }
}

impl Contract for SymptomAnalysisResult {
    const NAME: &'static str = "SymptomAnalysisResult";

    fn validate(&self) -> Result<(), SchemaViolation> {
        non_empty("primary_concern", &self.primary_concern)?;
        if !self.likely_conditions.iter().any(|c| !c.trim().is_empty()) {
            return Err(SchemaViolation::EmptyField("likely_conditions"));
        }
        if self.recommendations.is_empty() {
            return Err(SchemaViolation::EmptyField("recommendations"));
        }
        for rec in &self.recommendations {
            non_empty("recommendations.suggestion", &rec.suggestion)?;
        }
        if !(0.0..=100.0).contains(&self.confidence_level) {
            return Err(SchemaViolation::OutOfRange {
                field: "confidence_level",
                value: self.confidence_level.to_string(),
            });
        }
        Ok(())
    }

    fn fallback(concern: &str, preferences: Option<&str>) -> Self {
        symptom_fallback(concern, preferences)
    }

    fn set_ai_source(&mut self, source: AiSource) {
        self.ai_source = source.as_str().to_string();
    }

    fn attach_database_remedies(&mut self, matches: Vec<Remedy>) {
        self.database_remedies = Some(matches);
    }
}

/// 从 LLM 输出中提取 JSON 文本：优先 ```json 块，其次最外层 {...}
pub fn extract_json(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        return Some(rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim()));
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

/// 解析并校验候选结果
pub fn parse_candidate<T: Contract>(raw: &str) -> Result<T, SchemaViolation> {
    let json = extract_json(raw).ok_or(SchemaViolation::NoJson)?;
    let candidate: T =
        serde_json::from_str(json).map_err(|e| SchemaViolation::Parse(e.to_string()))?;
    candidate.validate()?;
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fenced_block() {
        let raw = "Here you go:\n```json\n{\"a\": 1}\n```\nEnjoy";
        assert_eq!(extract_json(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_outer_braces() {
        assert_eq!(extract_json("sure {\"a\": {\"b\": 2}} done"), Some("{\"a\": {\"b\": 2}}"));
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn test_parse_candidate_accepts_valid_remedy() {
        let raw = r#"{"name":"Ginger Tea","ingredients":["ginger"],"instructions":"Steep 10 minutes."}"#;
        let remedy: GeneratedRemedy = parse_candidate(raw).unwrap();
        assert_eq!(remedy.name, "Ginger Tea");
    }

    #[test]
    fn test_parse_candidate_rejects_missing_field() {
        let raw = r#"{"name":"Ginger Tea","ingredients":["ginger"]}"#;
        let err = parse_candidate::<GeneratedRemedy>(raw).unwrap_err();
        assert!(matches!(err, SchemaViolation::Parse(_)));
    }

    #[test]
    fn test_parse_candidate_rejects_empty_required_fields() {
        let raw = r#"{"name":"Ginger Tea","ingredients":[],"instructions":"Steep."}"#;
        assert_eq!(
            parse_candidate::<GeneratedRemedy>(raw).unwrap_err(),
            SchemaViolation::EmptyField("ingredients")
        );

        let raw = r#"{"name":"  ","ingredients":["ginger"],"instructions":"Steep."}"#;
        assert_eq!(
            parse_candidate::<GeneratedRemedy>(raw).unwrap_err(),
            SchemaViolation::EmptyField("name")
        );
    }

    #[test]
    fn test_parse_candidate_rejects_non_json() {
        assert_eq!(
            parse_candidate::<GeneratedRemedy>("I cannot help with that.").unwrap_err(),
            SchemaViolation::NoJson
        );
    }

    #[test]
    fn test_symptom_confidence_range() {
        let raw = r#"{
            "primary_concern": "headache",
            "likely_conditions": ["tension headache"],
            "root_causes": [],
            "recommendations": [{"suggestion": "hydrate", "how_to": "drink water", "confidence": "high"}],
            "natural_remedies": [],
            "confidence_level": 140
        }"#;
        assert!(matches!(
            parse_candidate::<SymptomAnalysisResult>(raw).unwrap_err(),
            SchemaViolation::OutOfRange { field: "confidence_level", .. }
        ));
    }

    #[test]
    fn test_symptom_missing_required_arrays_is_a_violation() {
        let raw = r#"{
            "primary_concern": "headache",
            "likely_conditions": ["tension headache"],
            "recommendations": [{"suggestion": "hydrate", "how_to": "drink water", "confidence": "high"}],
            "confidence_level": 70
        }"#;
        assert!(matches!(
            parse_candidate::<SymptomAnalysisResult>(raw).unwrap_err(),
            SchemaViolation::Parse(_)
        ));
    }

    #[test]
    fn test_symptom_requires_likely_conditions() {
        let raw = r#"{
            "primary_concern": "headache",
            "likely_conditions": [],
            "root_causes": [],
            "recommendations": [{"suggestion": "hydrate", "how_to": "drink water", "confidence": "high"}],
            "natural_remedies": [],
            "confidence_level": 70
        }"#;
        assert_eq!(
            parse_candidate::<SymptomAnalysisResult>(raw).unwrap_err(),
            SchemaViolation::EmptyField("likely_conditions")
        );
    }
}
