use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};

use crate::commands::fees;
use crate::db::{MarksEntry, Student};
use crate::error::{ElimuError, ElimuResult};
use crate::state::AppState;

pub const SEARCH_LIMIT: i64 = 100;

const STUDENT_SELECT: &str = "SELECT s.*, c.code AS class_code, p.name AS programme_name, d.name AS department_name \
     FROM students s \
     LEFT JOIN classes c ON s.class_id = c.id \
     LEFT JOIN programmes p ON s.programme_id = p.id \
     LEFT JOIN departments d ON s.department_id = d.id \
     WHERE 1=1";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSearchParams {
    pub search: Option<String>,
    pub class_id: Option<i32>,
    pub department_id: Option<i32>,
    pub programme_id: Option<i32>,
    pub academic_status: Option<String>,
    pub gender: Option<String>,
    pub session: Option<String>,
}

pub fn search_tokens(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(|t| t.to_string()).collect()
}

/// Multi-token free text must match every token against some name field
/// (AND across tokens, OR across fields). A single token also searches the
/// identifier fields. All structured filters combine with AND.
fn push_student_filters(qb: &mut QueryBuilder<Postgres>, params: &StudentSearchParams) {
    if let Some(text) = params.search.as_deref() {
        let tokens = search_tokens(text);
        if tokens.len() > 1 {
            for token in &tokens {
                let pattern = format!("%{}%", token);
                qb.push(" AND (s.first_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR s.last_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR s.middle_name ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        } else if let Some(token) = tokens.first() {
            let pattern = format!("%{}%", token);
            qb.push(" AND (s.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR s.last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR s.middle_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR s.admission_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR s.email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR s.phone ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR s.id_number ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    if let Some(id) = params.class_id {
        qb.push(" AND s.class_id = ").push_bind(id);
    }
    if let Some(id) = params.department_id {
        qb.push(" AND s.department_id = ").push_bind(id);
    }
    if let Some(id) = params.programme_id {
        qb.push(" AND s.programme_id = ").push_bind(id);
    }
    if let Some(status) = params.academic_status.as_deref() {
        qb.push(" AND s.academic_status = ").push_bind(status.to_string());
    }
    if let Some(gender) = params.gender.as_deref() {
        qb.push(" AND s.gender = ").push_bind(gender.to_string());
    }
    if let Some(session) = params.session.as_deref() {
        qb.push(" AND s.session = ").push_bind(session.to_string());
    }
}

pub async fn search_students(
    State(state): State<AppState>,
    Query(params): Query<StudentSearchParams>,
) -> ElimuResult<Json<Value>> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM students s WHERE 1=1");
    push_student_filters(&mut count_qb, &params);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(&state.pool)
        .await?;

    let mut qb = QueryBuilder::new(STUDENT_SELECT);
    push_student_filters(&mut qb, &params);
    qb.push(" ORDER BY s.last_name ASC, s.first_name ASC LIMIT ")
        .push_bind(SEARCH_LIMIT);

    let students: Vec<Student> = qb.build_query_as().fetch_all(&state.pool).await?;

    Ok(Json(json!({
        "success": true,
        "data": students,
        "pagination": { "total": total, "returned": students.len(), "limit": SEARCH_LIMIT }
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionNumberQuery {
    pub admission_number: String,
}

pub async fn get_student_by_admission(
    pool: &sqlx::PgPool,
    admission_number: &str,
) -> ElimuResult<Student> {
    let mut qb = QueryBuilder::new(STUDENT_SELECT);
    qb.push(" AND s.admission_number = ").push_bind(admission_number.to_string());
    qb.build_query_as()
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            ElimuError::NotFound(format!("No student with admission number {}", admission_number))
        })
}

pub async fn get_student_details(
    State(state): State<AppState>,
    Query(query): Query<AdmissionNumberQuery>,
) -> ElimuResult<Json<Value>> {
    let student = get_student_by_admission(&state.pool, &query.admission_number).await?;

    let attendance: (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE status = 'PRESENT'),
                COUNT(*) FILTER (WHERE status = 'LATE'),
                COUNT(*)
         FROM attendance_records WHERE student_id = $1",
    )
    .bind(student.id)
    .fetch_one(&state.pool)
    .await?;
    let (present, late, total) = attendance;
    let percentage = if total > 0 {
        ((present + late) as f64 / total as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    let marks: Vec<MarksEntry> = sqlx::query_as(
        "SELECT m.*, sub.name AS subject_name FROM marks_entries m
         JOIN subjects sub ON m.subject_id = sub.id
         WHERE m.student_id = $1 ORDER BY m.academic_year, m.session, sub.name",
    )
    .bind(student.id)
    .fetch_all(&state.pool)
    .await?;

    // A missing fee structure is a display gap here, not a failure.
    let balance = match fees::balance_for_student(&state.pool, &student).await {
        Ok(balance) => Some(balance),
        Err(ElimuError::NotFound(_)) => None,
        Err(e) => return Err(e),
    };

    Ok(Json(json!({
        "student": student,
        "attendance": {
            "present": present,
            "late": late,
            "total": total,
            "percentage": percentage
        },
        "marks": marks,
        "feeBalance": balance,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub admission_number: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub gender: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub id_number: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub class_id: Option<i32>,
    pub programme_id: Option<i32>,
    pub department_id: Option<i32>,
    pub academic_status: Option<String>,
    pub session: String,
    pub academic_year: String,
    pub cohort: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
}

pub async fn create_student(
    State(state): State<AppState>,
    Json(input): Json<StudentInput>,
) -> ElimuResult<Json<Student>> {
    if input.admission_number.trim().is_empty()
        || input.first_name.trim().is_empty()
        || input.last_name.trim().is_empty()
    {
        return Err(ElimuError::Validation(
            "Admission number, first name and last name are required.".to_string(),
        ));
    }

    let exists: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM students WHERE admission_number = $1")
            .bind(input.admission_number.trim())
            .fetch_one(&state.pool)
            .await?;
    if exists.0 > 0 {
        return Err(ElimuError::Conflict(format!(
            "Admission number {} is already in use.",
            input.admission_number.trim()
        )));
    }

    let student = sqlx::query_as::<_, Student>(
        "INSERT INTO students (
            admission_number, first_name, middle_name, last_name, gender, email, phone,
            id_number, date_of_birth, class_id, programme_id, department_id,
            academic_status, session, academic_year, cohort, guardian_name, guardian_phone
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
         RETURNING *",
    )
    .bind(input.admission_number.trim())
    .bind(input.first_name.trim())
    .bind(&input.middle_name)
    .bind(input.last_name.trim())
    .bind(&input.gender)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.id_number)
    .bind(input.date_of_birth)
    .bind(input.class_id)
    .bind(input.programme_id)
    .bind(input.department_id)
    .bind(input.academic_status.unwrap_or_else(|| "ACTIVE".to_string()))
    .bind(&input.session)
    .bind(&input.academic_year)
    .bind(&input.cohort)
    .bind(&input.guardian_name)
    .bind(&input.guardian_phone)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(student))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub id: i32,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub id_number: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub class_id: Option<i32>,
    pub programme_id: Option<i32>,
    pub department_id: Option<i32>,
    pub academic_status: Option<String>,
    pub session: Option<String>,
    pub academic_year: Option<String>,
    pub cohort: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial patch: absent fields keep their stored values.
pub async fn update_student(
    State(state): State<AppState>,
    Json(patch): Json<StudentPatch>,
) -> ElimuResult<Json<Value>> {
    let result = sqlx::query(
        "UPDATE students SET
            first_name = COALESCE($1, first_name),
            middle_name = COALESCE($2, middle_name),
            last_name = COALESCE($3, last_name),
            gender = COALESCE($4, gender),
            email = COALESCE($5, email),
            phone = COALESCE($6, phone),
            id_number = COALESCE($7, id_number),
            date_of_birth = COALESCE($8, date_of_birth),
            class_id = COALESCE($9, class_id),
            programme_id = COALESCE($10, programme_id),
            department_id = COALESCE($11, department_id),
            academic_status = COALESCE($12, academic_status),
            session = COALESCE($13, session),
            academic_year = COALESCE($14, academic_year),
            cohort = COALESCE($15, cohort),
            guardian_name = COALESCE($16, guardian_name),
            guardian_phone = COALESCE($17, guardian_phone),
            is_active = COALESCE($18, is_active)
         WHERE id = $19",
    )
    .bind(&patch.first_name)
    .bind(&patch.middle_name)
    .bind(&patch.last_name)
    .bind(&patch.gender)
    .bind(&patch.email)
    .bind(&patch.phone)
    .bind(&patch.id_number)
    .bind(patch.date_of_birth)
    .bind(patch.class_id)
    .bind(patch.programme_id)
    .bind(patch.department_id)
    .bind(&patch.academic_status)
    .bind(&patch.session)
    .bind(&patch.academic_year)
    .bind(&patch.cohort)
    .bind(&patch.guardian_name)
    .bind(&patch.guardian_phone)
    .bind(patch.is_active)
    .bind(patch.id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ElimuError::NotFound("Student not found.".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct StudentDeleteInput {
    pub id: i32,
}

pub async fn delete_student(
    State(state): State<AppState>,
    Json(input): Json<StudentDeleteInput>,
) -> ElimuResult<Json<Value>> {
    let payments: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM fee_payments WHERE student_id = $1")
            .bind(input.id)
            .fetch_one(&state.pool)
            .await?;
    if payments.0 > 0 {
        return Err(ElimuError::Validation(
            "This student has recorded fee payments and cannot be deleted. Mark the record inactive instead.".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM students WHERE id = $1")
        .bind(input.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ElimuError::NotFound("Student not found.".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
