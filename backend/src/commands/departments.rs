use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::Department;
use crate::error::{ElimuError, ElimuResult};
use crate::state::AppState;

pub async fn get_departments(
    State(state): State<AppState>,
) -> ElimuResult<Json<Vec<Department>>> {
    let departments =
        sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY name")
            .fetch_all(&state.pool)
            .await?;
    Ok(Json(departments))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentInput {
    pub id: Option<i32>,
    pub name: String,
    pub code: String,
    pub is_active: Option<bool>,
}

pub async fn save_department(
    State(state): State<AppState>,
    Json(input): Json<DepartmentInput>,
) -> ElimuResult<Json<Value>> {
    if input.name.trim().is_empty() || input.code.trim().is_empty() {
        return Err(ElimuError::Validation(
            "Department name and code are required.".to_string(),
        ));
    }

    if let Some(id) = input.id {
        sqlx::query("UPDATE departments SET name=$1, code=$2, is_active=$3 WHERE id=$4")
            .bind(input.name.trim())
            .bind(input.code.trim())
            .bind(input.is_active.unwrap_or(true))
            .bind(id)
            .execute(&state.pool)
            .await?;
    } else {
        sqlx::query("INSERT INTO departments (name, code, is_active) VALUES ($1,$2,$3)")
            .bind(input.name.trim())
            .bind(input.code.trim())
            .bind(input.is_active.unwrap_or(true))
            .execute(&state.pool)
            .await?;
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct DepartmentDeleteInput {
    pub id: i32,
}

pub async fn delete_department(
    State(state): State<AppState>,
    Json(input): Json<DepartmentDeleteInput>,
) -> ElimuResult<Json<Value>> {
    let programmes: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM programmes WHERE department_id = $1")
            .bind(input.id)
            .fetch_one(&state.pool)
            .await?;
    if programmes.0 > 0 {
        return Err(ElimuError::Validation(format!(
            "This department still owns {} programme(s) and cannot be deleted.",
            programmes.0
        )));
    }

    let result = sqlx::query("DELETE FROM departments WHERE id = $1")
        .bind(input.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ElimuError::NotFound("Department not found.".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
