use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::Class;
use crate::error::{ElimuError, ElimuResult};
use crate::state::AppState;

pub async fn get_classes(State(state): State<AppState>) -> ElimuResult<Json<Vec<Class>>> {
    let classes = sqlx::query_as::<_, Class>(
        "SELECT c.*, p.name AS programme_name
         FROM classes c
         JOIN programmes p ON c.programme_id = p.id
         ORDER BY c.code",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(classes))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInput {
    pub id: Option<i32>,
    pub code: String,
    pub programme_id: i32,
    pub intake_start: Option<chrono::NaiveDate>,
    pub intake_end: Option<chrono::NaiveDate>,
    pub mode_of_study: Option<String>,
    pub status: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn save_class(
    State(state): State<AppState>,
    Json(input): Json<ClassInput>,
) -> ElimuResult<Json<Value>> {
    if input.code.trim().is_empty() {
        return Err(ElimuError::Validation("Class code is required.".to_string()));
    }

    if let Some(id) = input.id {
        sqlx::query(
            "UPDATE classes SET code=$1, programme_id=$2, intake_start=$3, intake_end=$4,
                mode_of_study=$5, status=$6, is_active=$7
             WHERE id=$8",
        )
        .bind(input.code.trim())
        .bind(input.programme_id)
        .bind(input.intake_start)
        .bind(input.intake_end)
        .bind(input.mode_of_study.unwrap_or_else(|| "FULL_TIME".to_string()))
        .bind(input.status.unwrap_or_else(|| "ACTIVE".to_string()))
        .bind(input.is_active.unwrap_or(true))
        .bind(id)
        .execute(&state.pool)
        .await?;
    } else {
        sqlx::query(
            "INSERT INTO classes (code, programme_id, intake_start, intake_end, mode_of_study, status, is_active)
             VALUES ($1,$2,$3,$4,$5,$6,$7)",
        )
        .bind(input.code.trim())
        .bind(input.programme_id)
        .bind(input.intake_start)
        .bind(input.intake_end)
        .bind(input.mode_of_study.unwrap_or_else(|| "FULL_TIME".to_string()))
        .bind(input.status.unwrap_or_else(|| "ACTIVE".to_string()))
        .bind(input.is_active.unwrap_or(true))
        .execute(&state.pool)
        .await?;
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct ClassDeleteInput {
    pub id: i32,
}

pub async fn delete_class(
    State(state): State<AppState>,
    Json(input): Json<ClassDeleteInput>,
) -> ElimuResult<Json<Value>> {
    let students: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students WHERE class_id = $1")
        .bind(input.id)
        .fetch_one(&state.pool)
        .await?;
    if students.0 > 0 {
        return Err(ElimuError::Validation(format!(
            "This class has {} student(s) assigned and cannot be deleted.",
            students.0
        )));
    }

    let result = sqlx::query("DELETE FROM classes WHERE id = $1")
        .bind(input.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ElimuError::NotFound("Class not found.".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
