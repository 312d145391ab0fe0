use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::error::ElimuResult;

pub const TOKEN_COOKIE: &str = "token";
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        matches!(self.role.as_str(), "SUPER_ADMIN" | "ADMIN")
    }
}

pub fn get_jwt_secret() -> Vec<u8> {
    std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using insecure default!");
            "insecure-development-secret-key-replace-me-immediately".to_string()
        })
        .into_bytes()
}

pub fn issue_token(user: &User) -> ElimuResult<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        exp,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(&get_jwt_secret()),
    )?)
}

pub fn decode_token(token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(&get_jwt_secret()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

pub fn auth_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_auth_cookie() -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Token from the http-only cookie, with Authorization: Bearer as fallback
/// for non-browser clients.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    let auth_header = headers.get(header::AUTHORIZATION)?;
    let auth_header = auth_header.to_str().ok()?;
    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let path = request.uri().path();
    let public_routes = [
        "/api/auth/login",
        "/api/auth/register",
        "/api/auth/verify",
        "/api/ping",
    ];

    if !path.starts_with("/api/") || public_routes.contains(&path) {
        return Ok(next.run(request).await);
    }

    let token = token_from_headers(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    let claims = decode_token(&token).ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
