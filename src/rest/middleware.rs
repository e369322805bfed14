use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{AppState, User};
use crate::rbac::Identity;
use crate::rest::error::ApiError;

#[derive(Clone)]
pub struct AuthContext {
    pub user: User,
    pub identity: Identity,
}

/// Requires a logged-in, active user for every route it wraps.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = state
        .login_manager
        .token_from_headers(request.headers())
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.login_manager.decode(&token).map_err(|e| {
        debug!(error = %e, "Rejected session token");
        ApiError::Unauthorized
    })?;

    let user = User::find_by_id(&state.db, claims.uid)
        .await?
        .filter(|user| user.active)
        .ok_or(ApiError::Unauthorized)?;

    let identity = Identity::for_user(&user);

    info!(
        method = %request.method(),
        path = %request.uri().path(),
        user = %user.username,
        role = %user.role,
        "API request"
    );

    request.extensions_mut().insert(AuthContext { user, identity });

    Ok(next.run(request).await)
}
