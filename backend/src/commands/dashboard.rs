use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ElimuResult;
use crate::state::AppState;

/// Shared filter set for the dashboard roll-ups. Every query is independent
/// and reflects the database at its own execution time; counts across one
/// combined dashboard render may disagree under concurrent writes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    pub academic_status: Option<String>,
    pub academic_year: Option<String>,
    pub session: Option<String>,
}

#[derive(Debug, Default, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_students: i64,
    pub active_classes: i64,
    pub departments: i64,
    pub total_revenue: i64,
}

pub async fn get_dashboard_overview(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> ElimuResult<Json<DashboardOverview>> {
    let sql = r#"
        SELECT
            (SELECT COUNT(*) FROM students s
              WHERE ($1::text IS NULL OR s.academic_status = $1)
                AND ($2::text IS NULL OR s.academic_year = $2)
                AND ($3::text IS NULL OR s.session = $3)) as total_students,
            (SELECT COUNT(*) FROM classes WHERE status = 'ACTIVE' AND is_active) as active_classes,
            (SELECT COUNT(*) FROM departments WHERE is_active) as departments,
            (SELECT CAST(COALESCE(SUM(amount), 0) AS BIGINT) FROM fee_payments
              WHERE status = 'COMPLETED'
                AND ($2::text IS NULL OR academic_year = $2)
                AND ($3::text IS NULL OR session = $3)) as total_revenue
    "#;

    let overview = sqlx::query_as::<_, DashboardOverview>(sql)
        .bind(&params.academic_status)
        .bind(&params.academic_year)
        .bind(&params.session)
        .fetch_one(&state.pool)
        .await
        .unwrap_or_default();

    Ok(Json(overview))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GenderCount {
    pub gender: String,
    pub count: i64,
}

pub async fn get_gender_breakdown(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> ElimuResult<Json<Vec<GenderCount>>> {
    let rows = sqlx::query_as::<_, GenderCount>(
        "SELECT gender, COUNT(*) as count FROM students
         WHERE ($1::text IS NULL OR academic_status = $1)
           AND ($2::text IS NULL OR academic_year = $2)
           AND ($3::text IS NULL OR session = $3)
         GROUP BY gender ORDER BY gender",
    )
    .bind(&params.academic_status)
    .bind(&params.academic_year)
    .bind(&params.session)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentShare {
    pub department: String,
    pub students: i64,
    pub percentage: f64,
}

pub async fn get_department_population(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> ElimuResult<Json<Vec<DepartmentShare>>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT d.name, COUNT(s.id) as students
         FROM departments d
         LEFT JOIN students s ON s.department_id = d.id
           AND ($1::text IS NULL OR s.academic_status = $1)
           AND ($2::text IS NULL OR s.academic_year = $2)
           AND ($3::text IS NULL OR s.session = $3)
         WHERE d.is_active
         GROUP BY d.name ORDER BY students DESC",
    )
    .bind(&params.academic_status)
    .bind(&params.academic_year)
    .bind(&params.session)
    .fetch_all(&state.pool)
    .await?;

    let total: i64 = rows.iter().map(|(_, n)| n).sum();
    let shares = rows
        .into_iter()
        .map(|(department, students)| DepartmentShare {
            department,
            students,
            percentage: if total > 0 {
                ((students as f64 / total as f64) * 100.0 * 10.0).round() / 10.0
            } else {
                0.0
            },
        })
        .collect();

    Ok(Json(shares))
}

#[derive(Debug, Default, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCounts {
    pub registered: i64,
    pub unregistered: i64,
}

pub async fn get_subject_registration_counts(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> ElimuResult<Json<RegistrationCounts>> {
    let sql = r#"
        SELECT
            COUNT(*) FILTER (WHERE EXISTS (
                SELECT 1 FROM subject_registrations r
                WHERE r.student_id = s.id
                  AND ($2::text IS NULL OR r.academic_year = $2)
                  AND ($3::text IS NULL OR r.session = $3)
            )) as registered,
            COUNT(*) FILTER (WHERE NOT EXISTS (
                SELECT 1 FROM subject_registrations r
                WHERE r.student_id = s.id
                  AND ($2::text IS NULL OR r.academic_year = $2)
                  AND ($3::text IS NULL OR r.session = $3)
            )) as unregistered
        FROM students s
        WHERE ($1::text IS NULL OR s.academic_status = $1)
          AND ($2::text IS NULL OR s.academic_year = $2)
          AND ($3::text IS NULL OR s.session = $3)
    "#;

    let counts = sqlx::query_as::<_, RegistrationCounts>(sql)
        .bind(&params.academic_status)
        .bind(&params.academic_year)
        .bind(&params.session)
        .fetch_one(&state.pool)
        .await
        .unwrap_or_default();

    Ok(Json(counts))
}

#[derive(Debug, Default, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecordActivityCounts {
    pub active: i64,
    pub inactive: i64,
}

pub async fn get_record_activity_counts(
    State(state): State<AppState>,
) -> ElimuResult<Json<RecordActivityCounts>> {
    let counts = sqlx::query_as::<_, RecordActivityCounts>(
        "SELECT COUNT(*) FILTER (WHERE is_active) as active,
                COUNT(*) FILTER (WHERE NOT is_active) as inactive
         FROM students",
    )
    .fetch_one(&state.pool)
    .await
    .unwrap_or_default();

    Ok(Json(counts))
}

/// Applicants are every student record ever captured, regardless of current
/// academic status.
pub async fn get_applicants_by_gender(
    State(state): State<AppState>,
) -> ElimuResult<Json<Vec<GenderCount>>> {
    let rows = sqlx::query_as::<_, GenderCount>(
        "SELECT gender, COUNT(*) as count FROM students GROUP BY gender ORDER BY gender",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}
