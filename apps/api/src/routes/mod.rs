pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::agent::handlers as agent_handlers;
use crate::resume::handlers as resume_handlers;
use crate::state::AppState;

/// Uploads above this size are rejected before reaching the PDF extractor.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/resume/analyze", post(resume_handlers::handle_analyze))
        .route("/resume/:session_id", delete(resume_handlers::handle_delete))
        .route("/agent/chat", post(agent_handlers::handle_chat))
        .route("/agent/status", get(agent_handlers::handle_status))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm_client::LlmClient;
    use crate::store::MemorySessionStore;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn test_state() -> AppState {
        let config = Config {
            app_env: "development".to_string(),
            redis_url: None,
            openrouter_api_key: None,
            openrouter_api_url: "http://127.0.0.1:1/".to_string(),
            openrouter_model: "test/model".to_string(),
            llm_timeout: Duration::from_millis(100),
            llm_retries: 0,
            session_ttl_secs: 1800,
            port: 3000,
            rust_log: "info".to_string(),
        };
        AppState {
            store: Arc::new(MemorySessionStore::new()),
            llm: LlmClient::new(&config),
            config,
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_status_and_port() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["port"], 3000);
    }

    #[tokio::test]
    async fn test_status_lists_available_roles() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/agent/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ready"], true);
        assert_eq!(body["availableRoles"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_chat_with_unknown_session_returns_404() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::post("/agent/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"session_id": "unknown", "message": "What is her role?"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("upload your resume again"));
    }

    #[tokio::test]
    async fn test_chat_with_blank_message_returns_400() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::post("/agent/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"session_id": "s1", "message": "  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_analyze_with_empty_text_returns_400() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::post("/resume/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"text": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_then_delete_round_trip() {
        let state = test_state();
        let app = build_router(state.clone());

        // Upload without an API key: local-fallback summary, text stored.
        let response = app
            .clone()
            .oneshot(
                Request::post("/resume/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"text": "Jane Doe. 5 years backend engineer.", "session_id": "s1"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["session_id"], "s1");
        assert_eq!(body["engine"], "local-fallback");
        assert_eq!(body["extractedLength"], 35);
        assert!(!body["summary"].as_str().unwrap().is_empty());
        assert!(state.store.get("s1").await.unwrap().is_some());

        let response = app
            .oneshot(Request::delete("/resume/s1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.store.get("s1").await.unwrap().is_none());
    }
}
