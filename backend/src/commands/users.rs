use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::User;
use crate::error::{ElimuError, ElimuResult};
use crate::state::AppState;

pub async fn get_all_users(State(state): State<AppState>) -> ElimuResult<Json<Vec<User>>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, email, NULL::text as password_hash, first_name, last_name, role, is_active, created_at, updated_at
         FROM users ORDER BY id ASC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(users))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub id: i32,
    pub email: String,
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: Option<bool>,
}

pub async fn update_user(
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserRequest>,
) -> ElimuResult<Json<Value>> {
    let is_active = payload.is_active.unwrap_or(true);

    if let Some(password) = payload.password.filter(|p| !p.trim().is_empty()) {
        let hashed = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        sqlx::query(
            "UPDATE users SET email = $1, password_hash = $2, first_name = $3, last_name = $4,
             role = $5, is_active = $6, updated_at = CURRENT_TIMESTAMP WHERE id = $7",
        )
        .bind(payload.email)
        .bind(hashed)
        .bind(payload.first_name)
        .bind(payload.last_name)
        .bind(payload.role)
        .bind(is_active)
        .bind(payload.id)
        .execute(&state.pool)
        .await?;
        return Ok(Json(json!({ "success": true })));
    }

    sqlx::query(
        "UPDATE users SET email = $1, first_name = $2, last_name = $3, role = $4,
         is_active = $5, updated_at = CURRENT_TIMESTAMP WHERE id = $6",
    )
    .bind(payload.email)
    .bind(payload.first_name)
    .bind(payload.last_name)
    .bind(payload.role)
    .bind(is_active)
    .bind(payload.id)
    .execute(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct DeleteUserRequest {
    pub id: i32,
}

pub async fn delete_user(
    State(state): State<AppState>,
    Json(payload): Json<DeleteUserRequest>,
) -> ElimuResult<Json<Value>> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(payload.id)
        .fetch_optional(&state.pool)
        .await?;

    match role.as_deref() {
        None => return Err(ElimuError::NotFound("User not found.".to_string())),
        Some("SUPER_ADMIN") => {
            return Err(ElimuError::Validation(
                "The system administrator account cannot be deleted.".to_string(),
            ))
        }
        _ => {}
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(payload.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "success": true })))
}
