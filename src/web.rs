//! Axum-based HTTP control surface
//!
//! Start and stop requests are forwarded to the session machine and answered
//! immediately with `202 Accepted`; the machine applies its own guards, so
//! the returned view always shows the state it actually settled on.

use crate::error::{Result, SimError};
use crate::machine::SessionHandle;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::{IpAddr, SocketAddr};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub handle: SessionHandle,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("APP_VERSION"),
    }))
}

pub async fn session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.handle.view())
}

pub async fn start_session(State(state): State<AppState>) -> Response {
    queue(&state, SessionHandle::start)
}

pub async fn stop_session(State(state): State<AppState>) -> Response {
    queue(&state, SessionHandle::stop)
}

fn queue(state: &AppState, request: fn(&SessionHandle) -> Result<()>) -> Response {
    match request(&state.handle) {
        Ok(()) => (StatusCode::ACCEPTED, Json(state.handle.view())).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/session", get(session))
        .route("/api/session/start", post(start_session))
        .route("/api/session/stop", post(stop_session))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve the control surface until the listener fails
pub async fn serve(handle: SessionHandle, host: &str, port: u16) -> Result<()> {
    let router = build_router(AppState { handle });
    let logger = crate::logging::get_logger("web");

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SimError::web(format!("Failed to bind {}: {}", addr, e)))?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Control surface listening at http://{}:{}/api",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router)
        .await
        .map_err(|e| SimError::web(e.to_string()))
}
