//! 契约 JSON Schema 生成（schemars）
//!
//! 作为 schema 提示传给 Provider：OpenAI 拼入 system prompt，Gemini 裁剪后作为 responseSchema。
//! 子 Schema 内联、Option 以 nullable 表示，便于 Gemini 的 OpenAPI 子集接受。

use schemars::gen::SchemaSettings;
use serde_json::Value;

use crate::remedy::Contract;

/// 生成契约 T 的 JSON Schema（内联子 Schema，无 $ref）
pub fn contract_schema<T: Contract>() -> Value {
    let settings = SchemaSettings::openapi3().with(|s| {
        s.inline_subschemas = true;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();
    serde_json::to_value(&schema).unwrap_or(Value::Null)
}
