//! OpenAI 兼容 API 客户端（主 Provider）
//!
//! 通过 async_openai 调用 chat completion，开启 JSON object 模式并限制输出 token；
//! 返回首条 choice 的 content，期望是一个 JSON 对象。Schema 提示拼在 system 消息末尾。
//! SDK 默认会对 5xx 与限流做指数退避重试，这里关掉：失败直接交给流水线切换到下一个 Provider。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde_json::Value;

use crate::config::{env_credential, LlmOpenAiSection};
use crate::llm::{GenerationLimits, LlmError, ProviderAdapter};
use crate::remedy::{Message, Role};

pub const OPENAI_PROVIDER_ID: &str = "openai";

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// OpenAI 兼容客户端：持有 Client、model 与输出上限
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    limits: GenerationLimits,
    /// 累计 token 使用统计
    pub usage: TokenUsage,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: &str, limits: GenerationLimits) -> Self {
        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Self {
            client: Client::with_config(config).with_backoff(no_retry),
            model: model.to_string(),
            limits,
            usage: TokenUsage::new(),
        }
    }

    fn to_openai_messages(
        &self,
        messages: &[Message],
        schema_hint: Option<&Value>,
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        let mut out = Vec::with_capacity(messages.len());
        for m in messages {
            let msg = match m.role {
                Role::System => {
                    let content = match schema_hint {
                        Some(schema) => format!(
                            "{}\n\nThe JSON object must conform to this JSON Schema:\n{}",
                            m.content, schema
                        ),
                        None => m.content.clone(),
                    };
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(content)
                        .build()
                        .map(ChatCompletionRequestMessage::System)
                }
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::User),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::Assistant),
            };
            out.push(msg.map_err(|e| LlmError::Api(e.to_string()))?);
        }
        Ok(out)
    }
}

/// 将 SDK 错误归类：限流单独识别，其余按 API 错误处理
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    let text = err.to_string();
    if text.to_lowercase().contains("rate limit") {
        LlmError::RateLimited { retry_after_ms: 0 }
    } else {
        LlmError::Api(text)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiClient {
    fn id(&self) -> &str {
        OPENAI_PROVIDER_ID
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn generate(
        &self,
        messages: &[Message],
        schema_hint: Option<&Value>,
    ) -> Result<String, LlmError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.to_openai_messages(messages, schema_hint)?)
            .response_format(ResponseFormat::JsonObject)
            .max_completion_tokens(self.limits.max_output_tokens)
            .build()
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        if let Some(usage) = &response.usage {
            self.usage
                .add(usage.prompt_tokens as u64, usage.completion_tokens as u64);
        }

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

/// 从配置与环境变量创建主 Provider；未设置 OPENAI_API_KEY 时返回 None
pub fn create_openai_client(
    section: &LlmOpenAiSection,
    limits: GenerationLimits,
) -> Option<OpenAiClient> {
    let Some(key) = env_credential(&["OPENAI_API_KEY"]) else {
        tracing::debug!("openai provider skipped: no OPENAI_API_KEY");
        return None;
    };
    Some(OpenAiClient::new(
        section.base_url.as_deref(),
        &section.model,
        &key,
        limits,
    ))
}
