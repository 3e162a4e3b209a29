//! Provider 适配器抽象
//!
//! 每个外部文本生成后端（OpenAI / Gemini / Mock）实现 ProviderAdapter：
//! generate(messages, schema_hint) 返回原始文本，不做契约校验（校验由流水线负责）。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::remedy::Message;

/// Provider 调用错误
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited (retry after {retry_after_ms} ms)")]
    RateLimited { retry_after_ms: u64 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("empty response")]
    EmptyResponse,

    #[error("response too large: {len} chars (limit {limit})")]
    ResponseTooLarge { len: usize, limit: usize },

    /// 上游请求已被取消（客户端断开）
    #[error("cancelled")]
    Cancelled,
}

/// 单次调用的上限：输出 token 数
#[derive(Debug, Clone, Copy)]
pub struct GenerationLimits {
    pub max_output_tokens: u32,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_output_tokens: 2048,
        }
    }
}

/// Provider 适配器 trait：统一不同后端的请求/响应形状
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// 稳定标识，用于日志与轨迹（如 "openai"、"gemini"）
    fn id(&self) -> &str;

    /// 生成文本；schema_hint 为目标契约的 JSON Schema，不支持的后端可忽略
    async fn generate(
        &self,
        messages: &[Message],
        schema_hint: Option<&Value>,
    ) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
