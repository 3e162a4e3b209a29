//! Remedy AI HTTP 服务
//!
//! 启动: cargo run --bin remedy-web --features web
//! 接口: POST /api/remedies/generate、POST /api/symptoms/analyze、GET /health

#![cfg(feature = "web")]

use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::Deserialize;

use remedy_ai::config::load_config;
use remedy_ai::core::Reply;
use remedy_ai::remedy::{
    GeneratedRemedy, Message, RemedyRequest, SymptomAnalysisResult, SymptomQuery,
};
use remedy_ai::service::RemedyService;

struct AppState {
    service: RemedyService,
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    messages: Vec<Message>,
}

fn router(service: RemedyService) -> Router {
    let state = Arc::new(AppState { service });
    Router::new()
        .route("/api/remedies/generate", post(api_generate_remedy))
        .route("/api/symptoms/analyze", post(api_analyze_symptoms))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    remedy_ai::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        Default::default()
    });
    let bind = cfg.server.bind.clone();
    let app = router(RemedyService::from_config(cfg));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!("Remedy AI listening on http://{}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}

/// 客户端断开时 axum 丢弃该 future，在途的 Provider 调用随之取消
async fn api_generate_remedy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RemedyRequest>,
) -> Result<Json<Reply<GeneratedRemedy>>, (StatusCode, String)> {
    if req.health_concern.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "healthConcern is required".to_string()));
    }
    Ok(Json(state.service.generate_remedy(&req).await))
}

async fn api_analyze_symptoms(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Reply<SymptomAnalysisResult>>, (StatusCode, String)> {
    if req.messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "messages is required".to_string()));
    }
    let query = SymptomQuery::new(req.messages);
    Ok(Json(state.service.analyze_symptoms(&query).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use remedy_ai::classifier::REFUSAL_MESSAGE;
    use remedy_ai::config::AppConfig;
    use remedy_ai::core::OrchestratorBuilder;
    use remedy_ai::llm::MockProvider;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(primary_reply: &str) -> Router {
        let orchestrator = OrchestratorBuilder::new(AppConfig::default())
            .with_primary(Arc::new(MockProvider::responding("openai", primary_reply)))
            .build();
        router(RemedyService::new(Arc::new(orchestrator), 6))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_generate_remedy_returns_provider_object() {
        let reply = r#"{"name":"Fennel Tea","ingredients":["fennel"],"instructions":"Steep."}"#;
        let (status, body) = post_json(
            app(reply),
            "/api/remedies/generate",
            json!({"healthConcern": "bloating after meals"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Fennel Tea");
        assert_eq!(body["ai_source"], "OpenAI + Gemini");
    }

    #[tokio::test]
    async fn test_off_topic_returns_refusal_string() {
        let (status, body) = post_json(
            app("{}"),
            "/api/symptoms/analyze",
            json!({"messages": [{"role": "user", "content": "what's the weather tomorrow"}]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String(REFUSAL_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_empty_concern_is_bad_request() {
        let (status, _) = post_json(app("{}"), "/api/remedies/generate", json!({"healthConcern": " "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
