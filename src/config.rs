//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `REMEDY__*` 覆盖（双下划线表示嵌套，如 `REMEDY__LLM__OPENAI__MODEL=gpt-4o`）。
//! API Key 不进配置文件，只从 OPENAI_API_KEY / GEMINI_API_KEY 读取。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::llm::{GenerationLimits, GEMINI_FLASH};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub enrichment: EnrichmentSection,
    pub server: ServerSection,
}

/// [app] 段：应用名、症状问诊带入 Prompt 的历史轮数
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_history_turns: default_max_history_turns(),
        }
    }
}

fn default_max_history_turns() -> usize {
    6
}

/// [llm] 段：输出上限、超时与两个 Provider
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// 原始响应超过该字符数即视为失败
    #[serde(default = "default_max_response_chars")]
    pub max_response_chars: usize,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
    #[serde(default)]
    pub openai: LlmOpenAiSection,
    #[serde(default)]
    pub gemini: LlmGeminiSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            max_output_tokens: default_max_output_tokens(),
            max_response_chars: default_max_response_chars(),
            timeouts: LlmTimeoutsSection::default(),
            openai: LlmOpenAiSection::default(),
            gemini: LlmGeminiSection::default(),
        }
    }
}

impl LlmSection {
    pub fn limits(&self) -> GenerationLimits {
        GenerationLimits {
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.request_secs)
    }
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_max_response_chars() -> usize {
    32_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次 Provider 调用超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_secs: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// [llm.openai] 段：主 Provider
#[derive(Debug, Clone, Deserialize)]
pub struct LlmOpenAiSection {
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// 兼容网关地址，未设置时用官方地址
    pub base_url: Option<String>,
}

impl Default for LlmOpenAiSection {
    fn default() -> Self {
        Self {
            model: default_openai_model(),
            base_url: None,
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

/// [llm.gemini] 段：次 Provider
#[derive(Debug, Clone, Deserialize)]
pub struct LlmGeminiSection {
    #[serde(default = "default_gemini_model")]
    pub model: String,
    pub base_url: Option<String>,
}

impl Default for LlmGeminiSection {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            base_url: None,
        }
    }
}

fn default_gemini_model() -> String {
    GEMINI_FLASH.to_string()
}

/// [enrichment] 段：疗法库增强
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_enrichment_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
    /// JSON 疗法目录；未设置时不做增强
    pub catalog_path: Option<PathBuf>,
}

impl Default for EnrichmentSection {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_enrichment_timeout_ms(),
            max_matches: default_max_matches(),
            catalog_path: None,
        }
    }
}

impl EnrichmentSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_enrichment_timeout_ms() -> u64 {
    1500
}

fn default_max_matches() -> usize {
    5
}

/// [server] 段：remedy-web 监听地址
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// 从 config 目录加载配置，环境变量 REMEDY__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 REMEDY__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("REMEDY")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 读取非空环境变量
pub fn env_credential(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|n| std::env::var(n).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.timeouts.request_secs, 30);
        assert_eq!(cfg.llm.gemini.model, GEMINI_FLASH);
        assert_eq!(cfg.enrichment.max_matches, 5);
        assert_eq!(cfg.app.max_history_turns, 6);
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remedy.toml");
        std::fs::write(
            &path,
            r#"
[llm]
max_output_tokens = 1024

[llm.timeouts]
request_secs = 5

[llm.openai]
model = "gpt-4o"

[enrichment]
enabled = false
"#,
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.llm.max_output_tokens, 1024);
        assert_eq!(cfg.llm.request_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.llm.openai.model, "gpt-4o");
        assert!(!cfg.enrichment.enabled);
        assert_eq!(cfg.enrichment.timeout_ms, 1500);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let cfg = load_config(Some(PathBuf::from("/nonexistent/remedy.toml"))).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
    }
}
