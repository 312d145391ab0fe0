use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{HostelBlock, HostelBooking, HostelFloor, HostelRoom};
use crate::error::{ElimuError, ElimuResult};
use crate::state::AppState;

pub async fn get_blocks(State(state): State<AppState>) -> ElimuResult<Json<Vec<HostelBlock>>> {
    let blocks = sqlx::query_as::<_, HostelBlock>("SELECT * FROM hostel_blocks ORDER BY name")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(blocks))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInput {
    pub id: Option<i32>,
    pub name: String,
    pub gender: String,
    pub is_active: Option<bool>,
}

pub async fn save_block(
    State(state): State<AppState>,
    Json(input): Json<BlockInput>,
) -> ElimuResult<Json<Value>> {
    if input.name.trim().is_empty() {
        return Err(ElimuError::Validation("Block name is required.".to_string()));
    }

    if let Some(id) = input.id {
        sqlx::query("UPDATE hostel_blocks SET name=$1, gender=$2, is_active=$3 WHERE id=$4")
            .bind(input.name.trim())
            .bind(&input.gender)
            .bind(input.is_active.unwrap_or(true))
            .bind(id)
            .execute(&state.pool)
            .await?;
    } else {
        sqlx::query("INSERT INTO hostel_blocks (name, gender, is_active) VALUES ($1,$2,$3)")
            .bind(input.name.trim())
            .bind(&input.gender)
            .bind(input.is_active.unwrap_or(true))
            .execute(&state.pool)
            .await?;
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn get_block_floors(
    State(state): State<AppState>,
    Path(block_id): Path<i32>,
) -> ElimuResult<Json<Vec<HostelFloor>>> {
    let floors = sqlx::query_as::<_, HostelFloor>(
        "SELECT * FROM hostel_floors WHERE block_id = $1 ORDER BY level",
    )
    .bind(block_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(floors))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorInput {
    pub id: Option<i32>,
    pub block_id: i32,
    pub level: i32,
}

pub async fn save_floor(
    State(state): State<AppState>,
    Json(input): Json<FloorInput>,
) -> ElimuResult<Json<Value>> {
    if let Some(id) = input.id {
        sqlx::query("UPDATE hostel_floors SET block_id=$1, level=$2 WHERE id=$3")
            .bind(input.block_id)
            .bind(input.level)
            .bind(id)
            .execute(&state.pool)
            .await?;
    } else {
        sqlx::query("INSERT INTO hostel_floors (block_id, level) VALUES ($1,$2)")
            .bind(input.block_id)
            .bind(input.level)
            .execute(&state.pool)
            .await?;
    }
    Ok(Json(json!({ "success": true })))
}

/// Rooms listed with their current ACTIVE occupancy.
pub async fn get_floor_rooms(
    State(state): State<AppState>,
    Path(floor_id): Path<i32>,
) -> ElimuResult<Json<Vec<HostelRoom>>> {
    let rooms = sqlx::query_as::<_, HostelRoom>(
        "SELECT r.*, (SELECT COUNT(*) FROM hostel_bookings b
                      WHERE b.room_id = r.id AND b.status = 'ACTIVE') AS occupancy
         FROM hostel_rooms r
         WHERE r.floor_id = $1
         ORDER BY r.room_number",
    )
    .bind(floor_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rooms))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInput {
    pub id: Option<i32>,
    pub floor_id: i32,
    pub room_number: String,
    pub capacity: i32,
    pub is_active: Option<bool>,
}

pub async fn save_room(
    State(state): State<AppState>,
    Json(input): Json<RoomInput>,
) -> ElimuResult<Json<Value>> {
    if input.capacity <= 0 {
        return Err(ElimuError::Validation(
            "Room capacity must be at least 1.".to_string(),
        ));
    }

    if let Some(id) = input.id {
        sqlx::query(
            "UPDATE hostel_rooms SET floor_id=$1, room_number=$2, capacity=$3, is_active=$4 WHERE id=$5",
        )
        .bind(input.floor_id)
        .bind(input.room_number.trim())
        .bind(input.capacity)
        .bind(input.is_active.unwrap_or(true))
        .bind(id)
        .execute(&state.pool)
        .await?;
    } else {
        sqlx::query(
            "INSERT INTO hostel_rooms (floor_id, room_number, capacity, is_active) VALUES ($1,$2,$3,$4)",
        )
        .bind(input.floor_id)
        .bind(input.room_number.trim())
        .bind(input.capacity)
        .bind(input.is_active.unwrap_or(true))
        .execute(&state.pool)
        .await?;
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingInput {
    pub room_id: i32,
    pub student_id: i32,
    pub academic_year: String,
    pub session: String,
}

pub async fn create_booking(
    State(state): State<AppState>,
    Json(input): Json<BookingInput>,
) -> ElimuResult<Json<HostelBooking>> {
    let room: Option<HostelRoom> =
        sqlx::query_as("SELECT * FROM hostel_rooms WHERE id = $1")
            .bind(input.room_id)
            .fetch_optional(&state.pool)
            .await?;
    let room = room.ok_or_else(|| ElimuError::NotFound("Room not found.".to_string()))?;
    if !room.is_active {
        return Err(ElimuError::Validation(
            "This room is not available for booking.".to_string(),
        ));
    }

    // Read-then-write capacity check; two simultaneous bookings can both pass
    // it, same posture as the rest of the system.
    let occupied: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM hostel_bookings WHERE room_id = $1 AND status = 'ACTIVE'",
    )
    .bind(input.room_id)
    .fetch_one(&state.pool)
    .await?;
    if occupied.0 >= room.capacity as i64 {
        return Err(ElimuError::Validation(format!(
            "Room {} is already at capacity.",
            room.room_number
        )));
    }

    let existing: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM hostel_bookings
         WHERE student_id = $1 AND academic_year = $2 AND session = $3 AND status = 'ACTIVE'",
    )
    .bind(input.student_id)
    .bind(&input.academic_year)
    .bind(&input.session)
    .fetch_one(&state.pool)
    .await?;
    if existing.0 > 0 {
        return Err(ElimuError::Conflict(
            "The student already has an active booking for this session.".to_string(),
        ));
    }

    let booking = sqlx::query_as::<_, HostelBooking>(
        "INSERT INTO hostel_bookings (room_id, student_id, academic_year, session, status)
         VALUES ($1, $2, $3, $4, 'ACTIVE')
         RETURNING *",
    )
    .bind(input.room_id)
    .bind(input.student_id)
    .bind(&input.academic_year)
    .bind(&input.session)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(booking))
}

#[derive(Debug, Deserialize)]
pub struct BookingStatusInput {
    pub id: i32,
    pub status: String,
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    Json(input): Json<BookingStatusInput>,
) -> ElimuResult<Json<Value>> {
    if !matches!(input.status.as_str(), "CHECKED_OUT" | "CANCELLED") {
        return Err(ElimuError::Validation(format!(
            "Unknown booking status {}.",
            input.status
        )));
    }

    let result = sqlx::query(
        "UPDATE hostel_bookings SET status = $1 WHERE id = $2 AND status = 'ACTIVE'",
    )
    .bind(&input.status)
    .bind(input.id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ElimuError::NotFound(
            "No active booking with that id.".to_string(),
        ));
    }

    Ok(Json(json!({ "success": true })))
}

pub async fn get_student_bookings(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
) -> ElimuResult<Json<Vec<HostelBooking>>> {
    let bookings = sqlx::query_as::<_, HostelBooking>(
        "SELECT b.*, r.room_number, s.admission_number
         FROM hostel_bookings b
         JOIN hostel_rooms r ON b.room_id = r.id
         JOIN students s ON b.student_id = s.id
         WHERE b.student_id = $1
         ORDER BY b.booked_at DESC",
    )
    .bind(student_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(bookings))
}

pub async fn get_room_bookings(
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> ElimuResult<Json<Vec<HostelBooking>>> {
    let bookings = sqlx::query_as::<_, HostelBooking>(
        "SELECT b.*, r.room_number, s.admission_number
         FROM hostel_bookings b
         JOIN hostel_rooms r ON b.room_id = r.id
         JOIN students s ON b.student_id = s.id
         WHERE b.room_id = $1 AND b.status = 'ACTIVE'
         ORDER BY b.booked_at",
    )
    .bind(room_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(bookings))
}
