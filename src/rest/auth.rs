use axum::{
    extract::{Extension, Path, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::{authenticate_user, hash_password};
use crate::models::{AppState, NewUser, Role, User};
use crate::rbac::permissions;
use crate::rest::error::{ApiError, ApiResult};
use crate::rest::extract::ApiJson;
use crate::rest::handlers::require_text;
use crate::rest::middleware::{auth_middleware, AuthContext};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            active: user.active,
            created_at: user.created_at.to_rfc3339(),
            last_login_at: user.last_login_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    pub token_type: String,
    pub expires_at: String,
}

/// Routes mounted under `/auth`.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout));

    let protected_routes = Router::new()
        .route("/me", get(me))
        .route("/users", get(list_users))
        .route("/users/{id}", put(update_user))
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    public_routes.merge(protected_routes)
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let username = require_text("username", &req.username)?;
    let email = require_text("email", &req.email)?;
    if !email.contains('@') {
        return Err(ApiError::BadRequest("email is not a valid address".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let role = req.role.unwrap_or(Role::Customer);
    if role == Role::Admin {
        return Err(ApiError::Forbidden(
            "Administrator accounts cannot be self-registered".to_string(),
        ));
    }

    if User::exists(&state.db, username, email).await? {
        return Err(ApiError::Conflict("Username or email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password, state.config.password_hash_cost)?;
    let user = User::create(
        &state.db,
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role,
        },
    )
    .await?;

    info!(user = %user.username, role = %user.role, "Registered user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let user = authenticate_user(&state.db, req.username.trim(), &req.password)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Best effort: a failed timestamp write does not block the login
    let user = match User::touch_last_login(&state.db, user.id).await {
        Ok(_) => User::find_by_id(&state.db, user.id).await?.unwrap_or(user),
        Err(e) => {
            warn!(user_id = user.id, error = %e, "Could not record last login");
            user
        }
    };

    let session = state.login_manager.issue(&user)?;
    let body = LoginResponse {
        user: user.into(),
        token: session.token.clone(),
        token_type: "Bearer".to_string(),
        expires_at: session.expires_at.to_rfc3339(),
    };

    let mut response = Json(body).into_response();
    for value in state.login_manager.session_cookie(&session.token) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(response)
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    let mut response = Json(serde_json::json!({ "message": "Logged out" })).into_response();
    for value in state.login_manager.removal_cookie() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<UserResponse> {
    Json(auth.user.into())
}

pub async fn list_users(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    permissions::admin().require(&auth.identity)?;

    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn update_user(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    permissions::admin().require(&auth.identity)?;

    if req.role.is_none() && req.active.is_none() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let revokes_own_access =
        req.role.is_some_and(|role| role != Role::Admin) || req.active == Some(false);
    if id == auth.user.id && revokes_own_access {
        return Err(ApiError::BadRequest(
            "Administrators cannot revoke their own access".to_string(),
        ));
    }

    let user = User::update_access(&state.db, id, req.role, req.active)
        .await?
        .ok_or(ApiError::NotFound("User not found".to_string()))?;

    info!(user = %user.username, role = %user.role, active = user.active, "Updated user access");
    Ok(Json(user.into()))
}
