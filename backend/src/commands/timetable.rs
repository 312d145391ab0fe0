use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{BreakSlot, Room, TimetableSlot};
use crate::error::{ElimuError, ElimuResult};
use crate::state::AppState;

// --- Teaching rooms ---

pub async fn get_rooms(State(state): State<AppState>) -> ElimuResult<Json<Vec<Room>>> {
    let rooms = sqlx::query_as::<_, Room>("SELECT * FROM rooms ORDER BY name")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rooms))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInput {
    pub id: Option<i32>,
    pub name: String,
    pub capacity: i32,
    pub is_active: Option<bool>,
}

pub async fn save_room(
    State(state): State<AppState>,
    Json(input): Json<RoomInput>,
) -> ElimuResult<Json<Value>> {
    if input.name.trim().is_empty() {
        return Err(ElimuError::Validation("Room name is required.".to_string()));
    }

    if let Some(id) = input.id {
        sqlx::query("UPDATE rooms SET name=$1, capacity=$2, is_active=$3 WHERE id=$4")
            .bind(input.name.trim())
            .bind(input.capacity)
            .bind(input.is_active.unwrap_or(true))
            .bind(id)
            .execute(&state.pool)
            .await?;
    } else {
        sqlx::query("INSERT INTO rooms (name, capacity, is_active) VALUES ($1,$2,$3)")
            .bind(input.name.trim())
            .bind(input.capacity)
            .bind(input.is_active.unwrap_or(true))
            .execute(&state.pool)
            .await?;
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct IdInput {
    pub id: i32,
}

pub async fn delete_room(
    State(state): State<AppState>,
    Json(input): Json<IdInput>,
) -> ElimuResult<Json<Value>> {
    let in_use: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM timetable_slots WHERE room_id = $1")
        .bind(input.id)
        .fetch_one(&state.pool)
        .await?;
    if in_use.0 > 0 {
        return Err(ElimuError::Validation(
            "This room is scheduled on the timetable and cannot be deleted.".to_string(),
        ));
    }

    sqlx::query("DELETE FROM rooms WHERE id = $1")
        .bind(input.id)
        .execute(&state.pool)
        .await?;
    Ok(Json(json!({ "success": true })))
}

// --- Break slots ---

pub async fn get_break_slots(State(state): State<AppState>) -> ElimuResult<Json<Vec<BreakSlot>>> {
    let breaks = sqlx::query_as::<_, BreakSlot>(
        "SELECT * FROM break_slots ORDER BY day_of_week NULLS FIRST, start_time",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(breaks))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakSlotInput {
    pub id: Option<i32>,
    pub name: String,
    pub day_of_week: Option<i32>,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
}

pub async fn save_break_slot(
    State(state): State<AppState>,
    Json(input): Json<BreakSlotInput>,
) -> ElimuResult<Json<Value>> {
    if input.end_time <= input.start_time {
        return Err(ElimuError::Validation(
            "Break end time must be after the start time.".to_string(),
        ));
    }

    if let Some(id) = input.id {
        sqlx::query(
            "UPDATE break_slots SET name=$1, day_of_week=$2, start_time=$3, end_time=$4 WHERE id=$5",
        )
        .bind(&input.name)
        .bind(input.day_of_week)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(id)
        .execute(&state.pool)
        .await?;
    } else {
        sqlx::query(
            "INSERT INTO break_slots (name, day_of_week, start_time, end_time) VALUES ($1,$2,$3,$4)",
        )
        .bind(&input.name)
        .bind(input.day_of_week)
        .bind(input.start_time)
        .bind(input.end_time)
        .execute(&state.pool)
        .await?;
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn delete_break_slot(
    State(state): State<AppState>,
    Json(input): Json<IdInput>,
) -> ElimuResult<Json<Value>> {
    sqlx::query("DELETE FROM break_slots WHERE id = $1")
        .bind(input.id)
        .execute(&state.pool)
        .await?;
    Ok(Json(json!({ "success": true })))
}

// --- Timetable slots ---

pub async fn get_class_timetable(
    State(state): State<AppState>,
    Path(class_id): Path<i32>,
) -> ElimuResult<Json<Vec<TimetableSlot>>> {
    let slots = sqlx::query_as::<_, TimetableSlot>(
        "SELECT t.*, s.name AS subject_name, r.name AS room_name
         FROM timetable_slots t
         JOIN subjects s ON t.subject_id = s.id
         LEFT JOIN rooms r ON t.room_id = r.id
         WHERE t.class_id = $1
         ORDER BY t.day_of_week, t.start_time",
    )
    .bind(class_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(slots))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlotInput {
    pub id: Option<i32>,
    pub class_id: i32,
    pub subject_id: i32,
    pub day_of_week: i32,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub room_id: Option<i32>,
}

pub async fn save_timetable_slot(
    State(state): State<AppState>,
    Json(input): Json<TimetableSlotInput>,
) -> ElimuResult<Json<Value>> {
    if !(1..=7).contains(&input.day_of_week) {
        return Err(ElimuError::Validation(
            "Day of week must be between 1 (Monday) and 7 (Sunday).".to_string(),
        ));
    }
    if input.end_time <= input.start_time {
        return Err(ElimuError::Validation(
            "Lesson end time must be after the start time.".to_string(),
        ));
    }

    if let Some(id) = input.id {
        sqlx::query(
            "UPDATE timetable_slots SET class_id=$1, subject_id=$2, day_of_week=$3,
                start_time=$4, end_time=$5, room_id=$6 WHERE id=$7",
        )
        .bind(input.class_id)
        .bind(input.subject_id)
        .bind(input.day_of_week)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.room_id)
        .bind(id)
        .execute(&state.pool)
        .await?;
    } else {
        sqlx::query(
            "INSERT INTO timetable_slots (class_id, subject_id, day_of_week, start_time, end_time, room_id)
             VALUES ($1,$2,$3,$4,$5,$6)",
        )
        .bind(input.class_id)
        .bind(input.subject_id)
        .bind(input.day_of_week)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.room_id)
        .execute(&state.pool)
        .await?;
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn delete_timetable_slot(
    State(state): State<AppState>,
    Json(input): Json<IdInput>,
) -> ElimuResult<Json<Value>> {
    sqlx::query("DELETE FROM timetable_slots WHERE id = $1")
        .bind(input.id)
        .execute(&state.pool)
        .await?;
    Ok(Json(json!({ "success": true })))
}
