use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use biscotti::{Processor, ProcessorConfig, RemovalCookie, RequestCookies, ResponseCookie, ResponseCookies};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::config::{AppConfig, SessionCookieConfig};
use crate::models::{DatabaseError, Role, User};

pub const TOKEN_ISSUER: &str = "rapidxcel-logistics";

// JWT claims carried by the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // Username
    pub uid: i64,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
}

#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and reads login sessions.
///
/// The session is a signed token stored in a cookie whose attributes come from
/// [`SessionCookieConfig`]. Clients that cannot keep cookies may send the same
/// token as a bearer credential.
#[derive(Clone)]
pub struct LoginManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cookie: SessionCookieConfig,
    processor: Arc<Processor>,
}

impl LoginManager {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            cookie: config.session_cookie.clone(),
            processor: Arc::new(Processor::from(ProcessorConfig::default())),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie.name
    }

    pub fn issue(&self, user: &User) -> Result<SessionToken, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.cookie.ttl_hours);

        let claims = SessionClaims {
            sub: user.username.clone(),
            uid: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            iss: TOKEN_ISSUER.to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(SessionToken { token, expires_at })
    }

    pub fn decode(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.set_issuer(&[TOKEN_ISSUER]);
        let token_data: TokenData<SessionClaims> = decode(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// `Set-Cookie` values that store `token` on the client.
    pub fn session_cookie(&self, token: &str) -> Vec<HeaderValue> {
        let mut cookie = ResponseCookie::new(self.cookie.name.clone(), token.to_owned())
            .set_path(self.cookie.path.clone())
            .set_same_site(biscotti::SameSite::from(self.cookie.same_site))
            .set_max_age(biscotti::time::SignedDuration::from_hours(self.cookie.ttl_hours));
        if self.cookie.secure {
            cookie = cookie.set_secure(true);
        }
        if self.cookie.http_only {
            cookie = cookie.set_http_only(true);
        }

        let mut cookies = ResponseCookies::default();
        cookies.insert(cookie);
        self.header_values(cookies)
    }

    /// `Set-Cookie` values that make the client forget the session.
    pub fn removal_cookie(&self) -> Vec<HeaderValue> {
        let removal = RemovalCookie::new(self.cookie.name.clone()).set_path(self.cookie.path.clone());
        let mut cookies = ResponseCookies::default();
        cookies.insert(removal);
        self.header_values(cookies)
    }

    fn header_values(&self, cookies: ResponseCookies<'static>) -> Vec<HeaderValue> {
        cookies
            .header_values(&self.processor)
            .filter_map(|value| match HeaderValue::from_str(&value) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(cookie = %self.cookie.name, "Dropping cookie with an invalid header value");
                    None
                }
            })
            .collect()
    }

    /// The session token from the session cookie, or from a bearer header.
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let mut cookies = RequestCookies::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            // Skip malformed cookies instead of failing the request
            if let Err(e) = cookies.extend_from_header(value, &self.processor) {
                tracing::debug!(error = %e, "Ignoring malformed cookie header");
            }
        }
        if let Some(cookie) = cookies.get(&self.cookie.name) {
            return Some(cookie.value().to_string());
        }

        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

// Authentication functions
pub async fn authenticate_user(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<User>, DatabaseError> {
    if let Some(user) = User::find_by_username(pool, username).await? {
        if user.active && verify_password(password, &user.password_hash) {
            return Ok(Some(user));
        }
    }
    Ok(None)
}
