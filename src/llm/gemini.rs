//! Gemini generateContent 客户端（次 Provider）
//!
//! 直接用 reqwest 调用 REST 接口：System 消息放入 systemInstruction，其余转为 contents（assistant → model）；
//! schema 提示裁剪为 Gemini 接受的 OpenAPI 子集后作为 responseSchema，responseMimeType 固定为 application/json。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{env_credential, LlmGeminiSection};
use crate::llm::openai::TokenUsage;
use crate::llm::{GenerationLimits, LlmError, ProviderAdapter};
use crate::remedy::{Message, Role};

pub const GEMINI_PROVIDER_ID: &str = "gemini";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_FLASH: &str = "gemini-2.5-flash";

/// responseSchema 允许的关键字；其余（$schema、title、definitions、format、additionalProperties…）一律丢弃
const GEMINI_SCHEMA_KEYS: &[&str] = &[
    "type",
    "properties",
    "required",
    "items",
    "nullable",
    "enum",
    "description",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

/// 将 JSON Schema 递归裁剪为 Gemini responseSchema 支持的子集
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                if !GEMINI_SCHEMA_KEYS.contains(&key.as_str()) {
                    continue;
                }
                let value = match key.as_str() {
                    "properties" => match value {
                        Value::Object(props) => Value::Object(
                            props
                                .iter()
                                .map(|(name, sub)| (name.clone(), to_gemini_schema(sub)))
                                .collect(),
                        ),
                        other => other.clone(),
                    },
                    "items" => to_gemini_schema(value),
                    _ => value.clone(),
                };
                out.insert(key.clone(), value);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Gemini 客户端：持有 reqwest Client、endpoint、key 与输出上限
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    limits: GenerationLimits,
    timeout: Duration,
    pub usage: TokenUsage,
}

impl GeminiClient {
    pub fn new(
        base_url: Option<&str>,
        model: &str,
        api_key: &str,
        limits: GenerationLimits,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url
                .unwrap_or(GEMINI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            limits,
            timeout,
            usage: TokenUsage::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, messages: &[Message], schema_hint: Option<&Value>) -> GenerateContentRequest {
        let system: Vec<Part> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| Part {
                text: Some(m.content.clone()),
            })
            .collect();
        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some(match m.role {
                    Role::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                }),
                parts: vec![Part {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        GenerateContentRequest {
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: system,
            }),
            contents,
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema_hint.map(to_gemini_schema),
                max_output_tokens: self.limits.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiClient {
    fn id(&self) -> &str {
        GEMINI_PROVIDER_ID
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn generate(
        &self,
        messages: &[Message],
        schema_hint: Option<&Value>,
    ) -> Result<String, LlmError> {
        let body = self.build_request(messages, schema_hint);
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Api(format!("Request failed: {}", e))
                }
            })?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(0);
            return Err(LlmError::RateLimited { retry_after_ms });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Api(format!("Read body: {}", e)))?;

        if let Some(usage) = &parsed.usage_metadata {
            self.usage
                .add(usage.prompt_token_count, usage.candidates_token_count);
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

/// 从配置与环境变量创建次 Provider；GEMINI_API_KEY（或 GOOGLE_API_KEY）缺失时返回 None
pub fn create_gemini_client(
    section: &LlmGeminiSection,
    limits: GenerationLimits,
    timeout: Duration,
) -> Option<GeminiClient> {
    let Some(key) = env_credential(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]) else {
        tracing::debug!("gemini provider skipped: no GEMINI_API_KEY");
        return None;
    };
    Some(GeminiClient::new(
        section.base_url.as_deref(),
        &section.model,
        &key,
        limits,
        timeout,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::stub_server::StubServer;
    use serde_json::json;

    fn client() -> GeminiClient {
        GeminiClient::new(
            Some("http://localhost:9/v1beta/"),
            GEMINI_FLASH,
            "test-key",
            GenerationLimits::default(),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_schema_strips_unsupported_keys() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "GeneratedRemedy",
            "type": "object",
            "required": ["name"],
            "additionalProperties": true,
            "properties": {
                "name": {"type": "string", "description": "名称"},
                "ingredients": {"type": "array", "items": {"type": "string", "format": "x"}},
                "dosage": {"type": "string", "nullable": true, "default": null}
            }
        });
        let out = to_gemini_schema(&schema);
        assert!(out.get("$schema").is_none());
        assert!(out.get("title").is_none());
        assert!(out.get("additionalProperties").is_none());
        assert_eq!(out["required"], json!(["name"]));
        assert_eq!(out["properties"]["ingredients"]["items"], json!({"type": "string"}));
        assert_eq!(
            out["properties"]["dosage"],
            json!({"type": "string", "nullable": true})
        );
    }

    #[test]
    fn test_schema_keeps_property_named_like_keyword() {
        let schema = json!({
            "type": "object",
            "properties": {"title": {"type": "string"}}
        });
        let out = to_gemini_schema(&schema);
        assert_eq!(out["properties"]["title"], json!({"type": "string"}));
    }

    #[test]
    fn test_build_request_maps_roles() {
        let c = client();
        let messages = vec![
            Message::system("be brief"),
            Message::user("q"),
            Message::assistant("a"),
            Message::user("q2"),
        ];
        let body = serde_json::to_value(c.build_request(&messages, None)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            client().endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let result = client().generate(&[Message::user("hi")], None).await;
        assert!(result.is_err());
    }

    fn stub_client(server: &StubServer) -> GeminiClient {
        GeminiClient::new(
            Some(&format!("{}/v1beta", server.base_url)),
            GEMINI_FLASH,
            "test-key",
            GenerationLimits::default(),
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = StubServer::start(429, &[("retry-after", "7")], "{}").await;
        let result = stub_client(&server).generate(&[Message::user("hi")], None).await;
        assert!(matches!(result, Err(LlmError::RateLimited { retry_after_ms: 7000 })));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let server = StubServer::start(500, &[], "backend exploded").await;
        let result = stub_client(&server).generate(&[Message::user("hi")], None).await;
        match result {
            Err(LlmError::Http { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "backend exploded");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_joins_text_parts_of_first_candidate() {
        let body = json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "{\"name\":"}, {"text": "\"Tea\"}"}]}},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
        });
        let server = StubServer::start(200, &[], body.to_string()).await;
        let c = stub_client(&server);

        let text = c.generate(&[Message::user("hi")], None).await.unwrap();
        assert_eq!(text, r#"{"name":"Tea"}"#);
        assert_eq!(c.token_usage(), (10, 4, 14));

        let request = server.last_request().to_lowercase();
        assert!(request.contains("/v1beta/models/gemini-2.5-flash:generatecontent"));
        assert!(request.contains("x-goog-api-key: test-key"));
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_response() {
        let server = StubServer::start(200, &[], r#"{"candidates": []}"#).await;
        let result = stub_client(&server).generate(&[Message::user("hi")], None).await;
        assert!(matches!(result, Err(LlmError::EmptyResponse)));
    }
}
