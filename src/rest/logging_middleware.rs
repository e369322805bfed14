use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::models::AppState;

pub async fn request_logging_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);
    let start = Instant::now();

    // Presence of credentials only; they are validated by the auth middleware
    let caller = if state.login_manager.token_from_headers(request.headers()).is_some() {
        "session"
    } else {
        "anonymous"
    };

    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    if status.is_server_error() {
        warn!(
            method = %method,
            path = %uri.path(),
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            caller = %caller,
            origin = ?origin,
            "HTTP request failed"
        );
    } else {
        info!(
            method = %method,
            path = %uri.path(),
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            caller = %caller,
            origin = ?origin,
            "HTTP request"
        );
    }

    response
}
