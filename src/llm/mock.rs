//! Mock Provider（用于测试与离线运行，无需 API）
//!
//! 按脚本返回固定文本或错误，也可模拟挂起；记录调用次数与最后一条 User 消息，便于断言调用顺序。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{LlmError, ProviderAdapter};
use crate::remedy::{Message, Role};

/// Mock 的行为脚本
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// 返回给定文本
    Respond(String),
    /// 返回 HTTP 错误
    FailHttp(u16),
    /// 返回限流错误
    RateLimited,
    /// 睡眠后再返回文本，用于触发超时 / 取消
    Hang(Duration),
}

/// Mock Provider：固定行为 + 调用计数
#[derive(Debug)]
pub struct MockProvider {
    id: String,
    behavior: MockBehavior,
    calls: AtomicUsize,
    last_user: Mutex<Option<String>>,
}

impl MockProvider {
    pub fn new(id: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            id: id.into(),
            behavior,
            calls: AtomicUsize::new(0),
            last_user: Mutex::new(None),
        }
    }

    pub fn responding(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, MockBehavior::Respond(text.into()))
    }

    pub fn failing(id: impl Into<String>) -> Self {
        Self::new(id, MockBehavior::FailHttp(503))
    }

    /// 已被调用的次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 最近一次调用收到的最后一条 User 消息
    pub fn last_user_message(&self) -> Option<String> {
        self.last_user.lock().ok().and_then(|g| g.clone())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(
        &self,
        messages: &[Message],
        _schema_hint: Option<&Value>,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone());
        if let Ok(mut guard) = self.last_user.lock() {
            *guard = last_user;
        }

        match &self.behavior {
            MockBehavior::Respond(text) => Ok(text.clone()),
            MockBehavior::FailHttp(status) => Err(LlmError::Http {
                status: *status,
                body: "mock failure".to_string(),
            }),
            MockBehavior::RateLimited => Err(LlmError::RateLimited {
                retry_after_ms: 1000,
            }),
            MockBehavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("{}".to_string())
            }
        }
    }
}
