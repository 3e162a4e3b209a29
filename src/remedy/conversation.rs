//! 对话轮次：SymptomQuery 与单条消息
//!
//! 只有最后一条 User 消息驱动分析；更早的轮次作为可选上下文，按 max_turns 截断后拼入 Prompt，核心层不持久化。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 症状问诊输入：按时间顺序的历史轮次
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SymptomQuery {
    pub messages: Vec<Message>,
}

impl SymptomQuery {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// 最新一条 User 消息的内容；没有 User 消息时返回空串（领域门控会拒绝）
    pub fn latest_concern(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// 最新 User 消息之前的历史，最多保留最近 max_turns 轮（每轮 user + assistant）；System 消息不透传
    pub fn history_window(&self, max_turns: usize) -> Vec<Message> {
        let latest = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::User)
            .unwrap_or(0);
        let history: Vec<Message> = self.messages[..latest]
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect();
        let keep = max_turns * 2;
        if history.len() > keep {
            history[history.len() - keep..].to_vec()
        } else {
            history
        }
    }
}
