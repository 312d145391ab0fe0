use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::User;
use crate::error::{ElimuError, ElimuResult};
use crate::middleware::auth::{
    auth_cookie, decode_token, issue_token, token_from_headers, Claims, TOKEN_COOKIE,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role.clone(),
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ElimuResult<(CookieJar, Json<UserSummary>)> {
    if payload.email.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(ElimuError::Validation(
            "Email and password are required.".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.trim())
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ElimuError::Auth("Invalid email or password.".to_string()))?;

    let password_hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ElimuError::Auth("Invalid email or password.".to_string()))?;

    if !bcrypt::verify(&payload.password, password_hash)? {
        return Err(ElimuError::Auth("Invalid email or password.".to_string()));
    }

    // Correct password for a deactivated account still gets no cookie.
    if !user.is_active {
        return Err(ElimuError::Forbidden(
            "This account has been deactivated.".to_string(),
        ));
    }

    let token = issue_token(&user)?;
    tracing::info!("User {} logged in", user.email);

    Ok((jar.add(auth_cookie(token)), Json(UserSummary::from(&user))))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.remove(Cookie::build((TOKEN_COOKIE, "")).path("/").build());
    (jar, Json(json!({ "success": true, "data": null })))
}

/// Re-fetches the live user row: a valid token for a deleted or deactivated
/// account is still unauthenticated.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ElimuResult<Json<UserSummary>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&state.pool)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ElimuError::Auth("Session is no longer valid.".to_string()))?;

    Ok(Json(UserSummary::from(&user)))
}

/// Always 200: the dashboard polls this to decide whether to show the login
/// screen, so an expired token is a `false`, not an error.
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let claims = token_from_headers(&headers).and_then(|token| decode_token(&token));

    let user = match claims {
        Some(claims) => sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.pool)
            .await
            .ok()
            .flatten()
            .filter(|u| u.is_active),
        None => None,
    };

    match user {
        Some(user) => Json(json!({
            "success": true,
            "data": { "authenticated": true, "user": UserSummary::from(&user) }
        })),
        None => Json(json!({
            "success": true,
            "data": { "authenticated": false }
        })),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ElimuResult<Json<UserSummary>> {
    if payload.email.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(ElimuError::Validation(
            "Email and password are required.".to_string(),
        ));
    }

    let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(payload.email.trim())
        .fetch_one(&state.pool)
        .await?;
    if exists.0 > 0 {
        return Err(ElimuError::Conflict(
            "A user with this email already exists.".to_string(),
        ));
    }

    let hashed = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)?;
    let role = payload.role.unwrap_or_else(|| "STAFF".to_string());

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, first_name, last_name, role)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(payload.email.trim())
    .bind(hashed)
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(role)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(UserSummary::from(&user)))
}
