use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{FromRow, Pool, Postgres};
use std::str::FromStr;

use crate::error::{ElimuError, ElimuResult};

pub type DbPool = Pool<Postgres>;

pub async fn init_pool_with_options(opts: PgConnectOptions) -> ElimuResult<DbPool> {
    // connect_lazy_with returns immediately; the first query validates the connection.
    Ok(PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .idle_timeout(std::time::Duration::from_secs(120))
        .max_lifetime(std::time::Duration::from_secs(300))
        .connect_lazy_with(opts))
}

pub async fn init_pool(database_url: &str) -> ElimuResult<DbPool> {
    let opts = PgConnectOptions::from_str(database_url)
        .map_err(|e| ElimuError::Internal(format!("Invalid DB URL: {}", e)))?
        .ssl_mode(PgSslMode::Prefer);

    init_pool_with_options(opts).await
}

pub async fn init_database(pool: &DbPool) -> ElimuResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    let _ = ensure_seeds(pool).await;
    tracing::info!("Database ready");
    Ok(())
}

/// Idempotent demonstration seeds: the super admin, one department tree and
/// a fee structure so a fresh install has something to show.
async fn ensure_seeds(pool: &DbPool) -> ElimuResult<()> {
    let admin_email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@elimu.ac.ke".to_string());

    let admin_exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&admin_email)
        .fetch_one(pool)
        .await
        .unwrap_or((0,));
    if admin_exists.0 == 0 {
        if let Ok(hash) = bcrypt::hash("admin", bcrypt::DEFAULT_COST) {
            let _ = sqlx::query(
                "INSERT INTO users (email, password_hash, first_name, last_name, role)
                 VALUES ($1, $2, 'System', 'Administrator', 'SUPER_ADMIN') ON CONFLICT DO NOTHING",
            )
            .bind(&admin_email)
            .bind(hash)
            .execute(pool)
            .await;
        }
    }

    let dept_exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM departments")
        .fetch_one(pool)
        .await
        .unwrap_or((0,));
    if dept_exists.0 == 0 {
        let dept_id: i32 = sqlx::query_scalar(
            "INSERT INTO departments (name, code) VALUES ('Applied Sciences', 'AS') RETURNING id",
        )
        .fetch_one(pool)
        .await?;

        let prog_id: i32 = sqlx::query_scalar(
            "INSERT INTO programmes (name, code, department_id, level, duration_months, valid_from)
             VALUES ('Diploma in Information Technology', 'DIT', $1, 'DIPLOMA', 36, CURRENT_DATE)
             RETURNING id",
        )
        .bind(dept_id)
        .fetch_one(pool)
        .await?;

        let _ = sqlx::query(
            "INSERT INTO classes (code, programme_id, intake_start, mode_of_study, status)
             VALUES ('DIT/2025/S1', $1, CURRENT_DATE, 'FULL_TIME', 'ACTIVE') ON CONFLICT DO NOTHING",
        )
        .bind(prog_id)
        .execute(pool)
        .await;

        let _ = sqlx::query(
            "INSERT INTO fee_structures (programme_id, academic_year, session, total_fee, tuition_fee, exam_fee, library_fee, activity_fee)
             VALUES ($1, '2025/2026', 'SEPT_DEC', 60000, 45000, 6000, 4000, 5000) ON CONFLICT DO NOTHING",
        )
        .bind(prog_id)
        .execute(pool)
        .await;
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Programme {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub department_id: i32,
    #[sqlx(default)]
    pub department_name: Option<String>,
    pub level: String,
    pub duration_months: i32,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: i32,
    pub code: String,
    pub programme_id: i32,
    #[sqlx(default)]
    pub programme_name: Option<String>,
    pub intake_start: Option<NaiveDate>,
    pub intake_end: Option<NaiveDate>,
    pub mode_of_study: String,
    pub status: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i32,
    pub admission_number: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub gender: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub id_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub class_id: Option<i32>,
    pub programme_id: Option<i32>,
    pub department_id: Option<i32>,
    #[sqlx(default)]
    pub class_code: Option<String>,
    #[sqlx(default)]
    pub programme_name: Option<String>,
    #[sqlx(default)]
    pub department_name: Option<String>,
    pub academic_status: String,
    pub session: String,
    pub academic_year: String,
    pub cohort: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FeeStructure {
    pub id: i32,
    pub programme_id: i32,
    #[sqlx(default)]
    pub programme_name: Option<String>,
    pub academic_year: String,
    pub session: String,
    pub total_fee: i64,
    pub tuition_fee: i64,
    pub exam_fee: i64,
    pub library_fee: i64,
    pub activity_fee: i64,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FeePayment {
    pub id: i32,
    pub student_id: i32,
    #[sqlx(default)]
    pub admission_number: Option<String>,
    #[sqlx(default)]
    pub student_name: Option<String>,
    pub academic_year: String,
    pub session: String,
    pub amount: i64,
    pub payment_method: String,
    pub transaction_reference: String,
    pub payment_date: NaiveDate,
    pub status: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementRequest {
    pub id: i32,
    pub request_number: String,
    pub department_id: i32,
    #[sqlx(default)]
    pub department_name: Option<String>,
    pub item: String,
    pub quantity: i32,
    pub estimated_cost: i64,
    pub justification: Option<String>,
    pub status: String,
    pub requested_by: i32,
    pub approved_by: Option<i32>,
    pub approved_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub programme_id: i32,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRegistration {
    pub id: i32,
    pub student_id: i32,
    pub subject_id: i32,
    #[sqlx(default)]
    pub subject_name: Option<String>,
    pub academic_year: String,
    pub session: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: i32,
    pub student_id: i32,
    pub class_id: i32,
    pub attendance_date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MarksEntry {
    pub id: i32,
    pub student_id: i32,
    pub subject_id: i32,
    #[sqlx(default)]
    pub subject_name: Option<String>,
    pub academic_year: String,
    pub session: String,
    pub cat_score: i32,
    pub exam_score: i32,
    pub grade: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExamSchedule {
    pub id: i32,
    pub subject_id: i32,
    #[sqlx(default)]
    pub subject_name: Option<String>,
    pub class_id: i32,
    pub exam_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub id: i32,
    pub exam_schedule_id: i32,
    pub student_id: i32,
    pub score: i32,
    pub grade: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HostelBlock {
    pub id: i32,
    pub name: String,
    pub gender: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HostelFloor {
    pub id: i32,
    pub block_id: i32,
    pub level: i32,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HostelRoom {
    pub id: i32,
    pub floor_id: i32,
    pub room_number: String,
    pub capacity: i32,
    pub is_active: bool,
    #[sqlx(default)]
    pub occupancy: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HostelBooking {
    pub id: i32,
    pub room_id: i32,
    pub student_id: i32,
    #[sqlx(default)]
    pub room_number: Option<String>,
    #[sqlx(default)]
    pub admission_number: Option<String>,
    pub academic_year: String,
    pub session: String,
    pub status: String,
    pub booked_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlot {
    pub id: i32,
    pub class_id: i32,
    pub subject_id: i32,
    #[sqlx(default)]
    pub subject_name: Option<String>,
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room_id: Option<i32>,
    #[sqlx(default)]
    pub room_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BreakSlot {
    pub id: i32,
    pub name: String,
    pub day_of_week: Option<i32>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
