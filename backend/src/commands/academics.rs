use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::commands::utils::parse_date_safe;
use crate::db::{AttendanceRecord, ExamResult, ExamSchedule, MarksEntry, Subject, SubjectRegistration};
use crate::error::{ElimuError, ElimuResult};
use crate::state::AppState;

/// KNEC-style grade bands over the combined score.
pub fn grade_for_score(total: i32) -> &'static str {
    match total {
        t if t >= 70 => "A",
        t if t >= 60 => "B",
        t if t >= 50 => "C",
        t if t >= 40 => "D",
        _ => "E",
    }
}

pub fn attendance_percentage(present: i64, late: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((present + late) as f64 / total as f64 * 1000.0).round() / 10.0
}

// --- Attendance ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceInput {
    pub student_id: i32,
    pub class_id: i32,
    pub attendance_date: String,
    pub status: String,
}

pub async fn record_attendance(
    State(state): State<AppState>,
    Json(input): Json<AttendanceInput>,
) -> ElimuResult<Json<Value>> {
    let date = parse_date_safe(&input.attendance_date)
        .ok_or_else(|| ElimuError::Validation("Invalid attendance date.".to_string()))?;

    if !matches!(input.status.as_str(), "PRESENT" | "ABSENT" | "LATE") {
        return Err(ElimuError::Validation(format!(
            "Unknown attendance status {}.",
            input.status
        )));
    }

    // Re-marking the same day overwrites the earlier status.
    sqlx::query(
        "INSERT INTO attendance_records (student_id, class_id, attendance_date, status)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (student_id, class_id, attendance_date)
         DO UPDATE SET status = EXCLUDED.status",
    )
    .bind(input.student_id)
    .bind(input.class_id)
    .bind(date)
    .bind(&input.status)
    .execute(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub student_id: i32,
    pub present: i64,
    pub late: i64,
    pub absent: i64,
    pub total: i64,
    pub percentage: f64,
}

pub async fn get_attendance_summary(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
) -> ElimuResult<Json<AttendanceSummary>> {
    let (present, late, absent, total): (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE status = 'PRESENT'),
                COUNT(*) FILTER (WHERE status = 'LATE'),
                COUNT(*) FILTER (WHERE status = 'ABSENT'),
                COUNT(*)
         FROM attendance_records WHERE student_id = $1",
    )
    .bind(student_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(AttendanceSummary {
        student_id,
        present,
        late,
        absent,
        total,
        percentage: attendance_percentage(present, late, total),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAttendanceQuery {
    pub class_id: i32,
    pub date: String,
}

pub async fn get_class_attendance(
    State(state): State<AppState>,
    Query(query): Query<ClassAttendanceQuery>,
) -> ElimuResult<Json<Vec<AttendanceRecord>>> {
    let date = parse_date_safe(&query.date)
        .ok_or_else(|| ElimuError::Validation("Invalid date.".to_string()))?;

    let records = sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendance_records WHERE class_id = $1 AND attendance_date = $2
         ORDER BY student_id",
    )
    .bind(query.class_id)
    .bind(date)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(records))
}

// --- Subjects ---

pub async fn get_subjects(State(state): State<AppState>) -> ElimuResult<Json<Vec<Subject>>> {
    let subjects =
        sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY programme_id, name")
            .fetch_all(&state.pool)
            .await?;
    Ok(Json(subjects))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInput {
    pub id: Option<i32>,
    pub name: String,
    pub code: String,
    pub programme_id: i32,
}

pub async fn save_subject(
    State(state): State<AppState>,
    Json(input): Json<SubjectInput>,
) -> ElimuResult<Json<Value>> {
    if let Some(id) = input.id {
        sqlx::query("UPDATE subjects SET name=$1, code=$2, programme_id=$3 WHERE id=$4")
            .bind(&input.name)
            .bind(&input.code)
            .bind(input.programme_id)
            .bind(id)
            .execute(&state.pool)
            .await?;
    } else {
        sqlx::query("INSERT INTO subjects (name, code, programme_id) VALUES ($1,$2,$3)")
            .bind(&input.name)
            .bind(&input.code)
            .bind(input.programme_id)
            .execute(&state.pool)
            .await?;
    }
    Ok(Json(json!({ "success": true })))
}

// --- Subject registration ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInput {
    pub student_id: i32,
    pub subject_id: i32,
    pub academic_year: String,
    pub session: String,
}

pub async fn register_subject(
    State(state): State<AppState>,
    Json(input): Json<RegistrationInput>,
) -> ElimuResult<Json<Value>> {
    let duplicate: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM subject_registrations
         WHERE student_id = $1 AND subject_id = $2 AND academic_year = $3 AND session = $4",
    )
    .bind(input.student_id)
    .bind(input.subject_id)
    .bind(&input.academic_year)
    .bind(&input.session)
    .fetch_one(&state.pool)
    .await?;
    if duplicate.0 > 0 {
        return Err(ElimuError::Conflict(
            "The student is already registered for this subject in this session.".to_string(),
        ));
    }

    sqlx::query(
        "INSERT INTO subject_registrations (student_id, subject_id, academic_year, session)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(input.student_id)
    .bind(input.subject_id)
    .bind(&input.academic_year)
    .bind(&input.session)
    .execute(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn get_student_registrations(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
) -> ElimuResult<Json<Vec<SubjectRegistration>>> {
    let registrations = sqlx::query_as::<_, SubjectRegistration>(
        "SELECT r.*, s.name AS subject_name
         FROM subject_registrations r
         JOIN subjects s ON r.subject_id = s.id
         WHERE r.student_id = $1
         ORDER BY r.academic_year DESC, r.session, s.name",
    )
    .bind(student_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(registrations))
}

// --- Marks ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksInput {
    pub student_id: i32,
    pub subject_id: i32,
    pub academic_year: String,
    pub session: String,
    pub cat_score: i32,
    pub exam_score: i32,
}

pub async fn save_marks(
    State(state): State<AppState>,
    Json(input): Json<MarksInput>,
) -> ElimuResult<Json<MarksEntry>> {
    if !(0..=30).contains(&input.cat_score) || !(0..=70).contains(&input.exam_score) {
        return Err(ElimuError::Validation(
            "CAT score must be 0-30 and exam score 0-70.".to_string(),
        ));
    }

    let grade = grade_for_score(input.cat_score + input.exam_score);

    let entry = sqlx::query_as::<_, MarksEntry>(
        "INSERT INTO marks_entries (student_id, subject_id, academic_year, session, cat_score, exam_score, grade)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (student_id, subject_id, academic_year, session)
         DO UPDATE SET cat_score = EXCLUDED.cat_score, exam_score = EXCLUDED.exam_score,
                       grade = EXCLUDED.grade
         RETURNING *",
    )
    .bind(input.student_id)
    .bind(input.subject_id)
    .bind(&input.academic_year)
    .bind(&input.session)
    .bind(input.cat_score)
    .bind(input.exam_score)
    .bind(grade)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(entry))
}

pub async fn get_student_marks(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
) -> ElimuResult<Json<Vec<MarksEntry>>> {
    let marks = sqlx::query_as::<_, MarksEntry>(
        "SELECT m.*, s.name AS subject_name
         FROM marks_entries m
         JOIN subjects s ON m.subject_id = s.id
         WHERE m.student_id = $1
         ORDER BY m.academic_year DESC, m.session, s.name",
    )
    .bind(student_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(marks))
}

// --- Exams ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamScheduleInput {
    pub id: Option<i32>,
    pub subject_id: i32,
    pub class_id: i32,
    pub exam_date: String,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub venue: Option<String>,
}

pub async fn save_exam_schedule(
    State(state): State<AppState>,
    Json(input): Json<ExamScheduleInput>,
) -> ElimuResult<Json<Value>> {
    let exam_date = parse_date_safe(&input.exam_date)
        .ok_or_else(|| ElimuError::Validation("Invalid exam date.".to_string()))?;
    if input.end_time <= input.start_time {
        return Err(ElimuError::Validation(
            "Exam end time must be after the start time.".to_string(),
        ));
    }

    if let Some(id) = input.id {
        sqlx::query(
            "UPDATE exam_schedules SET subject_id=$1, class_id=$2, exam_date=$3,
                start_time=$4, end_time=$5, venue=$6 WHERE id=$7",
        )
        .bind(input.subject_id)
        .bind(input.class_id)
        .bind(exam_date)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(&input.venue)
        .bind(id)
        .execute(&state.pool)
        .await?;
    } else {
        sqlx::query(
            "INSERT INTO exam_schedules (subject_id, class_id, exam_date, start_time, end_time, venue)
             VALUES ($1,$2,$3,$4,$5,$6)",
        )
        .bind(input.subject_id)
        .bind(input.class_id)
        .bind(exam_date)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(&input.venue)
        .execute(&state.pool)
        .await?;
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct ExamScheduleDeleteInput {
    pub id: i32,
}

pub async fn delete_exam_schedule(
    State(state): State<AppState>,
    Json(input): Json<ExamScheduleDeleteInput>,
) -> ElimuResult<Json<Value>> {
    let results: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM exam_results WHERE exam_schedule_id = $1")
            .bind(input.id)
            .fetch_one(&state.pool)
            .await?;
    if results.0 > 0 {
        return Err(ElimuError::Validation(
            "Results have been recorded against this exam and it cannot be deleted.".to_string(),
        ));
    }

    sqlx::query("DELETE FROM exam_schedules WHERE id = $1")
        .bind(input.id)
        .execute(&state.pool)
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn get_class_exam_schedules(
    State(state): State<AppState>,
    Path(class_id): Path<i32>,
) -> ElimuResult<Json<Vec<ExamSchedule>>> {
    let schedules = sqlx::query_as::<_, ExamSchedule>(
        "SELECT e.*, s.name AS subject_name
         FROM exam_schedules e
         JOIN subjects s ON e.subject_id = s.id
         WHERE e.class_id = $1
         ORDER BY e.exam_date, e.start_time",
    )
    .bind(class_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(schedules))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResultInput {
    pub exam_schedule_id: i32,
    pub student_id: i32,
    pub score: i32,
}

pub async fn record_exam_result(
    State(state): State<AppState>,
    Json(input): Json<ExamResultInput>,
) -> ElimuResult<Json<ExamResult>> {
    if !(0..=100).contains(&input.score) {
        return Err(ElimuError::Validation("Score must be 0-100.".to_string()));
    }

    let grade = grade_for_score(input.score);

    let result = sqlx::query_as::<_, ExamResult>(
        "INSERT INTO exam_results (exam_schedule_id, student_id, score, grade)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (exam_schedule_id, student_id)
         DO UPDATE SET score = EXCLUDED.score, grade = EXCLUDED.grade
         RETURNING *",
    )
    .bind(input.exam_schedule_id)
    .bind(input.student_id)
    .bind(input.score)
    .bind(grade)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(result))
}

pub async fn get_student_exam_results(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
) -> ElimuResult<Json<Vec<ExamResult>>> {
    let results = sqlx::query_as::<_, ExamResult>(
        "SELECT * FROM exam_results WHERE student_id = $1 ORDER BY id DESC",
    )
    .bind(student_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(results))
}
