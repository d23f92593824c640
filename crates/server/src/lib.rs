//! HTTP and WebSocket surface for gangway.
//!
//! Tool servers dial in over `GET /ws/{identity}`; chat clients post to
//! `POST /chat`; `GET /health` reports every connection's readiness and
//! tool count.

mod ws;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::ws::WebSocketUpgrade,
    extract::{Path as AxPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use mcp::McpHost;
use runtime::{ChatOutcome, ChatService, Decider, Message};

/// Shared application state for the gangway HTTP server.
pub struct AppState<D> {
    /// Connection core: registry, dispatchers, handshakes.
    pub host: Arc<McpHost>,
    /// Chat orchestration over the same registry.
    pub chat: ChatService<D>,
}

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Identity of the tool-server connection to chat against.
    pub identity: String,
    pub query: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

/// An API error with HTTP status code and message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<runtime::Error> for ApiError {
    fn from(e: runtime::Error) -> Self {
        let status = match &e {
            runtime::Error::Mcp(mcp::Error::ConnectionNotFound(_)) => StatusCode::NOT_FOUND,
            runtime::Error::Mcp(mcp::Error::SessionNotReady(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

/// Build the Axum router with all gangway routes.
pub fn build_router<D>(state: Arc<AppState<D>>) -> Router
where
    D: Decider + 'static,
{
    Router::new()
        .route("/health", get(cmd_health::<D>))
        .route("/chat", post(cmd_chat::<D>))
        .route("/ws/{identity}", get(cmd_ws::<D>))
        .with_state(state)
}

async fn cmd_health<D: Decider + 'static>(
    State(state): State<Arc<AppState<D>>>,
) -> impl IntoResponse {
    let connections: BTreeMap<String, mcp::ConnectionStatus> =
        state.host.statuses().into_iter().collect();
    Json(json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339(),
        "connections": connections,
    }))
}

async fn cmd_chat<D: Decider + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatOutcome>, ApiError> {
    let outcome = state
        .chat
        .chat(&req.identity, &req.query, &req.history)
        .await?;
    Ok(Json(outcome))
}

async fn cmd_ws<D: Decider + 'static>(
    upgrade: WebSocketUpgrade,
    AxPath(identity): AxPath<String>,
    State(state): State<Arc<AppState<D>>>,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| async move {
        info!(%identity, "tool server connected");
        state.host.attach(identity, ws::transport(socket)).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use mcp::{DEFAULT_REQUEST_TIMEOUT, HostConfig, Transport};
    use runtime::{DecideRequest, Decision};
    use tower::ServiceExt;

    #[derive(Clone)]
    struct CannedDecider(String);

    impl Decider for CannedDecider {
        async fn decide(&self, _request: DecideRequest<'_>) -> runtime::Result<Decision> {
            Ok(Decision::Answer(self.0.clone()))
        }
    }

    fn app(answer: &str) -> (Arc<AppState<CannedDecider>>, Router) {
        let host = Arc::new(McpHost::new(HostConfig::default()));
        let chat = ChatService::new(
            Arc::clone(host.registry()),
            CannedDecider(answer.to_string()),
        );
        let state = Arc::new(AppState { host, chat });
        let router = build_router(state.clone());
        (state, router)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_request(identity: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(format!(
                r#"{{"identity":"{identity}","query":"hi"}}"#
            )))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_connection_statuses() {
        let (state, router) = app("unused");
        let (local, _remote) = Transport::pair();
        state
            .host
            .registry()
            .register("alpha", local.sink, DEFAULT_REQUEST_TIMEOUT);
        state.host.registry().mark_ready("alpha");

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["connections"]["alpha"]["ready"], true);
        assert_eq!(json["connections"]["alpha"]["tool_count"], 0);
    }

    #[tokio::test]
    async fn chat_against_unknown_identity_is_404() {
        let (_state, router) = app("unused");

        let response = router.oneshot(chat_request("nobody")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("nobody"));
    }

    #[tokio::test]
    async fn chat_before_handshake_is_400() {
        let (state, router) = app("unused");
        let (local, _remote) = Transport::pair();
        state
            .host
            .registry()
            .register("half-open", local.sink, DEFAULT_REQUEST_TIMEOUT);

        let response = router.oneshot(chat_request("half-open")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_direct_answer_round_trips() {
        let (state, router) = app("hello");
        let (local, _remote) = Transport::pair();
        state
            .host
            .registry()
            .register("alpha", local.sink, DEFAULT_REQUEST_TIMEOUT);
        state.host.registry().mark_ready("alpha");

        let response = router.oneshot(chat_request("alpha")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["answer"], "hello");
        assert_eq!(json["tools_used"], serde_json::json!([]));
        assert_eq!(json["tool_results"], serde_json::json!([]));
    }
}
