//! 输出契约：RemedyRequest、GeneratedRemedy、SymptomAnalysisResult
//!
//! 所有实体只在单次请求内存在。未知顶层字段收进 `extra` 并原样序列化回去，
//! Provider 的合法输出不会被静默丢字段；`ai_source` / `database_remedies` 由编排层写入，不进入 Schema 提示。
//! 可选字段用 [`Nullable`] 区分「缺省」与「显式 null」，Provider 给出的 null 会原样回写。

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::enrich::Remedy;

/// 可选字段的三态：None 缺省，Some(None) 显式 null，Some(Some(v)) 有值
pub type Nullable<T> = Option<Option<T>>;

/// 字段只要出现就包一层 Some，null 因此落到 Some(None)
fn present<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 生成疗法的请求
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedyRequest {
    pub health_concern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
}

impl RemedyRequest {
    pub fn new(health_concern: impl Into<String>) -> Self {
        Self {
            health_concern: health_concern.into(),
            preferences: None,
        }
    }

    pub fn with_preferences(mut self, preferences: impl Into<String>) -> Self {
        self.preferences = Some(preferences.into());
        self
    }
}

/// 疗法生成的输出契约：name / ingredients / instructions 必须存在且非空
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedRemedy {
    /// 疗法名称
    pub name: String,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Nullable<String>,
    /// 配料（至少一项）
    pub ingredients: Vec<String>,
    #[schemars(with = "Option<Vec<String>>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub benefits: Nullable<Vec<String>>,
    /// 制作与使用步骤
    pub instructions: String,
    /// 剂型，如 tea、tincture、balm
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub form: Nullable<String>,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub dosage: Nullable<String>,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub duration: Nullable<String>,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub safety: Nullable<String>,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub scientific_basis: Nullable<String>,
    #[schemars(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_source: Option<String>,
    #[schemars(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_remedies: Option<Vec<Remedy>>,
    #[schemars(skip)]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 建议的置信度：Provider 可能给分数，也可能给 high/medium/low
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Score(f64),
    Label(String),
}

impl Confidence {
    pub fn label(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub suggestion: String,
    pub how_to: String,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub why_it_works: Nullable<String>,
    /// high / medium / low
    #[schemars(with = "String")]
    pub confidence: Confidence,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NaturalRemedy {
    pub remedy_name: String,
    pub dosage: String,
    pub preparation: String,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub scientific_basis: Nullable<String>,
}

/// 症状分析的输出契约：root_causes、natural_remedies 必须出现；primary_concern、likely_conditions、recommendations 非空，confidence_level ∈ [0, 100]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SymptomAnalysisResult {
    pub primary_concern: String,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub understanding: Nullable<String>,
    pub likely_conditions: Vec<String>,
    pub root_causes: Vec<String>,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub science_explanation: Nullable<String>,
    pub recommendations: Vec<Recommendation>,
    pub natural_remedies: Vec<NaturalRemedy>,
    #[schemars(skip)]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub healing_protocol: Nullable<Map<String, Value>>,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub prevention_strategy: Nullable<String>,
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub warning_signs: Nullable<String>,
    /// 0-100
    pub confidence_level: f64,
    #[schemars(skip)]
    #[serde(default)]
    pub ai_source: String,
    #[schemars(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_remedies: Option<Vec<Remedy>>,
    #[schemars(skip)]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
