use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    serve, Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{ChatError, GenerationError};
use crate::service::ChatService;

#[derive(Debug, Serialize)]
pub struct OutboundChat {
    reply: String,
}

// Shared application state
#[derive(Clone)]
struct AppState {
    service: ChatService,
}

fn message_text(value: Option<serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn reply(status: StatusCode, text: impl Into<String>) -> (StatusCode, Json<OutboundChat>) {
    (status, Json(OutboundChat { reply: text.into() }))
}

// The body is parsed as JSON whatever its Content-Type says. `message` may be
// any JSON value; see `message_text`.
async fn chat_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let message = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(serde_json::Value::Null) | Err(_) => {
            warn!(bytes = body.len(), "Rejected unparseable chat body");
            return reply(
                StatusCode::OK,
                GenerationError::Transport("unparseable chat body".to_string()).to_string(),
            );
        }
        Ok(value) => value.get("message").cloned(),
    };

    match state.service.answer(&message_text(message)).await {
        Err(e @ ChatError::EmptyQuestion) => reply(StatusCode::BAD_REQUEST, e.to_string()),
        Ok(answer) if answer.is_misconfigured() => {
            reply(StatusCode::INTERNAL_SERVER_ERROR, answer.reply)
        }
        // Upstream failures travel in `reply`, not in the status code.
        Ok(answer) => reply(StatusCode::OK, answer.reply),
    }
}

async fn profile_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.profile().document().clone())
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router(service: ChatService) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/profile", get(profile_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(
    port: u16,
    service: ChatService,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    // Bind using tokio::net::TcpListener
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("Web server failed")?;

    Ok(())
}
