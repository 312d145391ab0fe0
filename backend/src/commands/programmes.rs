use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::Programme;
use crate::error::{ElimuError, ElimuResult};
use crate::state::AppState;

const PROGRAMME_LEVELS: [&str; 4] = ["ARTISAN", "CERTIFICATE", "DIPLOMA", "HIGHER_DIPLOMA"];

pub async fn get_programmes(State(state): State<AppState>) -> ElimuResult<Json<Vec<Programme>>> {
    let programmes = sqlx::query_as::<_, Programme>(
        "SELECT p.*, d.name AS department_name
         FROM programmes p
         JOIN departments d ON p.department_id = d.id
         ORDER BY p.name",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(programmes))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgrammeInput {
    pub id: Option<i32>,
    pub name: String,
    pub code: String,
    pub department_id: i32,
    pub level: String,
    pub duration_months: i32,
    pub valid_from: Option<chrono::NaiveDate>,
    pub valid_to: Option<chrono::NaiveDate>,
    pub is_active: Option<bool>,
}

pub async fn save_programme(
    State(state): State<AppState>,
    Json(input): Json<ProgrammeInput>,
) -> ElimuResult<Json<Value>> {
    if input.name.trim().is_empty() || input.code.trim().is_empty() {
        return Err(ElimuError::Validation(
            "Programme name and code are required.".to_string(),
        ));
    }
    if !PROGRAMME_LEVELS.contains(&input.level.as_str()) {
        return Err(ElimuError::Validation(format!(
            "Unknown programme level {}.",
            input.level
        )));
    }

    if let Some(id) = input.id {
        sqlx::query(
            "UPDATE programmes SET name=$1, code=$2, department_id=$3, level=$4,
                duration_months=$5, valid_from=$6, valid_to=$7, is_active=$8
             WHERE id=$9",
        )
        .bind(input.name.trim())
        .bind(input.code.trim())
        .bind(input.department_id)
        .bind(&input.level)
        .bind(input.duration_months)
        .bind(input.valid_from)
        .bind(input.valid_to)
        .bind(input.is_active.unwrap_or(true))
        .bind(id)
        .execute(&state.pool)
        .await?;
    } else {
        sqlx::query(
            "INSERT INTO programmes (name, code, department_id, level, duration_months,
                valid_from, valid_to, is_active)
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
        )
        .bind(input.name.trim())
        .bind(input.code.trim())
        .bind(input.department_id)
        .bind(&input.level)
        .bind(input.duration_months)
        .bind(input.valid_from)
        .bind(input.valid_to)
        .bind(input.is_active.unwrap_or(true))
        .execute(&state.pool)
        .await?;
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct ProgrammeDeleteInput {
    pub id: i32,
}

/// A programme with enrolled students or scheduled classes stays put.
pub async fn delete_programme(
    State(state): State<AppState>,
    Json(input): Json<ProgrammeDeleteInput>,
) -> ElimuResult<Json<Value>> {
    let (students, classes): (i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM students WHERE programme_id = $1),
                (SELECT COUNT(*) FROM classes WHERE programme_id = $1)",
    )
    .bind(input.id)
    .fetch_one(&state.pool)
    .await?;

    if students > 0 {
        return Err(ElimuError::Validation(format!(
            "This programme has {} enrolled student(s) and cannot be deleted.",
            students
        )));
    }
    if classes > 0 {
        return Err(ElimuError::Validation(format!(
            "This programme has {} class(es) scheduled against it and cannot be deleted.",
            classes
        )));
    }

    let result = sqlx::query("DELETE FROM programmes WHERE id = $1")
        .bind(input.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ElimuError::NotFound("Programme not found.".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
