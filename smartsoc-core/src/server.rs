//! JSON dashboard API built on axum.
//!
//! Read-only views of the simulation plus start/stop controls and an optional
//! chat endpoint. Handlers only talk to the engine through its handle.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::chat::{ChatAssistant, ReplyKind};
use crate::config::ServerConfig;
use crate::engine::EngineHandle;
use crate::error::{ChatError, EngineError};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct ApiState {
    engine: EngineHandle,
    chat: Option<Arc<ChatAssistant>>,
    started: Instant,
}

impl ApiState {
    pub fn new(engine: EngineHandle, chat: Option<Arc<ChatAssistant>>) -> Self {
        Self {
            engine,
            chat,
            started: Instant::now(),
        }
    }
}

/// Error body: `{"error": "..."}` with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: e.to_string(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        let status = match e {
            ChatError::Busy => StatusCode::CONFLICT,
            ChatError::EmptyQuery => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

type ApiResult = Result<Response, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub kind: ReplyKind,
}

/// Build the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/events", get(events_handler))
        .route("/api/incidents", get(incidents_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/aggregates", get(aggregates_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/simulation/start", post(start_handler))
        .route("/api/simulation/stop", post(stop_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/history", get(chat_history_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<ApiState>) -> ApiResult {
    let status = state.engine.status().await?;
    Ok(Json(json!({
        "status": "ok",
        "simulation": status.state,
        "timers": status.timers,
        "sinks": status.sinks,
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
    .into_response())
}

async fn events_handler(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(state.engine.events().await?).into_response())
}

async fn incidents_handler(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(state.engine.incidents().await?).into_response())
}

async fn stats_handler(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(state.engine.stats().await?).into_response())
}

async fn aggregates_handler(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(state.engine.aggregates().await?).into_response())
}

async fn dashboard_handler(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(state.engine.dashboard().await?).into_response())
}

async fn start_handler(State(state): State<ApiState>) -> ApiResult {
    let changed = state.engine.start().await?;
    Ok(Json(json!({ "state": "running", "changed": changed })).into_response())
}

async fn stop_handler(State(state): State<ApiState>) -> ApiResult {
    let changed = state.engine.stop().await?;
    Ok(Json(json!({ "state": "stopped", "changed": changed })).into_response())
}

fn chat_unavailable() -> ApiError {
    ApiError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: "Chat assistant is not configured".to_string(),
    }
}

async fn chat_handler(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult {
    let chat = state.chat.as_ref().ok_or_else(chat_unavailable)?;
    if let Ok(stats) = state.engine.stats().await {
        chat.set_context(stats.context_summary());
    }
    let reply = chat.ask(&request.query).await?;
    Ok(Json(ChatResponse {
        answer: reply.text,
        kind: reply.kind,
    })
    .into_response())
}

async fn chat_history_handler(State(state): State<ApiState>) -> ApiResult {
    let chat = state.chat.as_ref().ok_or_else(chat_unavailable)?;
    Ok(Json(chat.history().await).into_response())
}

/// Serve the API on the configured address until `shutdown` resolves.
pub async fn run<F>(config: &ServerConfig, state: ApiState, shutdown: F) -> Result<(), std::io::Error>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Dashboard API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
