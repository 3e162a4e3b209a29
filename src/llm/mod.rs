//! Provider 层：适配器抽象与实现（OpenAI / Gemini / Mock）

pub mod gemini;
pub mod mock;
pub mod openai;
pub mod traits;

#[cfg(test)]
pub(crate) mod stub_server;

pub use gemini::{create_gemini_client, GeminiClient, GEMINI_FLASH, GEMINI_PROVIDER_ID};
pub use mock::{MockBehavior, MockProvider};
pub use openai::{create_openai_client, OpenAiClient, TokenUsage, OPENAI_PROVIDER_ID};
pub use traits::{GenerationLimits, LlmError, ProviderAdapter};
