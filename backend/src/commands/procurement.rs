use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::{Datelike, Local};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::ProcurementRequest;
use crate::error::{ElimuError, ElimuResult};
use crate::middleware::auth::Claims;
use crate::state::AppState;

/// PENDING -> {APPROVED, REJECTED}; APPROVED -> IN_PROGRESS -> COMPLETED.
pub fn transition_allowed(from: &str, to: &str) -> bool {
    matches!(
        (from, to),
        ("PENDING", "APPROVED")
            | ("PENDING", "REJECTED")
            | ("APPROVED", "IN_PROGRESS")
            | ("IN_PROGRESS", "COMPLETED")
    )
}

pub fn format_request_number(year: i32, sequence: i64) -> String {
    format!("PR/{}/{}", year, sequence)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementInput {
    pub department_id: i32,
    pub item: String,
    pub quantity: Option<i32>,
    pub estimated_cost: i64,
    pub justification: Option<String>,
}

pub async fn create_procurement_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<ProcurementInput>,
) -> ElimuResult<Json<ProcurementRequest>> {
    if input.item.trim().is_empty() {
        return Err(ElimuError::Validation("Item description is required.".to_string()));
    }

    let year = Local::now().year();

    // Count-then-format numbering; concurrent creations in the same year can
    // collide. Known and accepted.
    let existing: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM procurement_requests WHERE EXTRACT(YEAR FROM created_at)::int = $1",
    )
    .bind(year)
    .fetch_one(&state.pool)
    .await?;
    let request_number = format_request_number(year, existing.0 + 1);

    let request = sqlx::query_as::<_, ProcurementRequest>(
        "INSERT INTO procurement_requests
            (request_number, department_id, item, quantity, estimated_cost, justification,
             status, requested_by)
         VALUES ($1, $2, $3, $4, $5, $6, 'PENDING', $7)
         RETURNING *",
    )
    .bind(&request_number)
    .bind(input.department_id)
    .bind(input.item.trim())
    .bind(input.quantity.unwrap_or(1))
    .bind(input.estimated_cost)
    .bind(&input.justification)
    .bind(claims.sub)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(request))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementListParams {
    pub status: Option<String>,
    pub department_id: Option<i32>,
}

pub async fn get_procurement_requests(
    State(state): State<AppState>,
    Query(params): Query<ProcurementListParams>,
) -> ElimuResult<Json<Vec<ProcurementRequest>>> {
    let requests = sqlx::query_as::<_, ProcurementRequest>(
        "SELECT pr.*, d.name AS department_name
         FROM procurement_requests pr
         JOIN departments d ON pr.department_id = d.id
         WHERE ($1::text IS NULL OR pr.status = $1)
           AND ($2::int IS NULL OR pr.department_id = $2)
         ORDER BY pr.created_at DESC, pr.id DESC",
    )
    .bind(&params.status)
    .bind(params.department_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(requests))
}

#[derive(Debug, Deserialize)]
pub struct ProcurementStatusInput {
    pub id: i32,
    pub status: String,
}

pub async fn update_procurement_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<ProcurementStatusInput>,
) -> ElimuResult<Json<Value>> {
    let current: Option<String> =
        sqlx::query_scalar("SELECT status FROM procurement_requests WHERE id = $1")
            .bind(input.id)
            .fetch_optional(&state.pool)
            .await?;

    let current = current
        .ok_or_else(|| ElimuError::NotFound("Procurement request not found.".to_string()))?;

    if !transition_allowed(&current, &input.status) {
        return Err(ElimuError::Validation(format!(
            "Cannot move a {} request to {}.",
            current, input.status
        )));
    }

    if input.status == "APPROVED" || input.status == "REJECTED" {
        if !claims.is_admin() {
            return Err(ElimuError::Forbidden(
                "Only an administrator can approve or reject requests.".to_string(),
            ));
        }
        sqlx::query(
            "UPDATE procurement_requests
             SET status = $1, approved_by = $2, approved_at = CURRENT_TIMESTAMP
             WHERE id = $3",
        )
        .bind(&input.status)
        .bind(claims.sub)
        .bind(input.id)
        .execute(&state.pool)
        .await?;
    } else {
        sqlx::query("UPDATE procurement_requests SET status = $1 WHERE id = $2")
            .bind(&input.status)
            .bind(input.id)
            .execute(&state.pool)
            .await?;
    }

    Ok(Json(json!({ "success": true })))
}
