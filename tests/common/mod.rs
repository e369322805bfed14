#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use rapidxcel_logistics::auth::hash_password;
use rapidxcel_logistics::models::{NewUser, Role, User};
use rapidxcel_logistics::{create_app, App, ConfigOverride};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_HASH_COST: u32 = 4;

pub struct TestApp {
    pub dir: TempDir,
    pub app: App,
}

pub fn test_config(dir: &TempDir) -> ConfigOverride {
    ConfigOverride {
        instance_path: Some(dir.path().join("instance")),
        password_hash_cost: Some(TEST_HASH_COST),
        ..ConfigOverride::default()
    }
}

pub async fn spawn_app() -> TestApp {
    let dir = TempDir::new().expect("tempdir");
    let app = create_app(Some(test_config(&dir))).await.expect("create_app");
    TestApp { dir, app }
}

pub fn password_for(username: &str) -> String {
    format!("{username}-password")
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Inserts a user directly, bypassing registration rules.
    pub async fn create_user(&self, username: &str, role: Role) -> User {
        let password_hash = hash_password(&password_for(username), TEST_HASH_COST).unwrap();
        User::create(
            &self.app.state.db,
            NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash,
                role,
            },
        )
        .await
        .unwrap()
    }

    /// Logs in and returns the `Cookie` header value carrying the session.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "password": password_for(username),
                })),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login as {username}");
        session_cookie(&response).expect("session cookie")
    }

    pub async fn user_with_session(&self, username: &str, role: Role) -> (User, String) {
        let user = self.create_user(username, role).await;
        let cookie = self.login(username).await;
        (user, cookie)
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str, cookie: &str) -> Request<Body> {
    json_request(Method::GET, uri, Some(cookie), None)
}

/// `name=value` of the first `Set-Cookie` header.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|pair| pair.trim().to_string())
}

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn read_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
