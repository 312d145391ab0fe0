use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::commands::students::{get_student_by_admission, AdmissionNumberQuery};
use crate::commands::utils::parse_date_safe;
use crate::db::{DbPool, FeePayment, FeeStructure, Student};
use crate::error::{ElimuError, ElimuResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBalance {
    pub admission_number: String,
    pub academic_year: String,
    pub session: String,
    pub total_fee: i64,
    pub total_paid: i64,
    pub balance: i64,
}

/// Overpayment goes negative and is reported as-is; there is no proration.
pub fn outstanding_balance(total_fee: i64, total_paid: i64) -> i64 {
    total_fee - total_paid
}

/// Outstanding balance = active structure total − Σ COMPLETED payments in the
/// student's (programme, year, session) scope.
pub async fn balance_for_student(pool: &DbPool, student: &Student) -> ElimuResult<FeeBalance> {
    let programme_id = student.programme_id.ok_or_else(|| {
        ElimuError::NotFound(format!(
            "Student {} is not attached to a programme.",
            student.admission_number
        ))
    })?;

    let structure: Option<FeeStructure> = sqlx::query_as(
        "SELECT * FROM fee_structures
         WHERE programme_id = $1 AND academic_year = $2 AND session = $3 AND is_active = TRUE",
    )
    .bind(programme_id)
    .bind(&student.academic_year)
    .bind(&student.session)
    .fetch_optional(pool)
    .await?;

    let structure = structure.ok_or_else(|| {
        ElimuError::NotFound(format!(
            "No active fee structure for this programme in {} {}.",
            student.academic_year, student.session
        ))
    })?;

    let total_paid: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(amount)::bigint FROM fee_payments
         WHERE student_id = $1 AND academic_year = $2 AND session = $3 AND status = 'COMPLETED'",
    )
    .bind(student.id)
    .bind(&student.academic_year)
    .bind(&student.session)
    .fetch_one(pool)
    .await?;
    let total_paid = total_paid.unwrap_or(0);

    Ok(FeeBalance {
        admission_number: student.admission_number.clone(),
        academic_year: student.academic_year.clone(),
        session: student.session.clone(),
        total_fee: structure.total_fee,
        total_paid,
        balance: outstanding_balance(structure.total_fee, total_paid),
    })
}

pub async fn get_student_fee_balance(
    State(state): State<AppState>,
    Query(query): Query<AdmissionNumberQuery>,
) -> ElimuResult<Json<FeeBalance>> {
    let student = get_student_by_admission(&state.pool, &query.admission_number).await?;
    let balance = balance_for_student(&state.pool, &student).await?;
    Ok(Json(balance))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentInput {
    pub admission_number: String,
    pub academic_year: String,
    pub session: String,
    pub amount: i64,
    pub payment_method: String,
    pub transaction_ref: String,
    pub payment_date: Option<String>,
}

pub async fn record_fee_payment(
    State(state): State<AppState>,
    Json(input): Json<RecordPaymentInput>,
) -> ElimuResult<Json<FeePayment>> {
    if input.amount <= 0 {
        return Err(ElimuError::Validation(
            "Payment amount must be greater than zero.".to_string(),
        ));
    }
    let reference = input.transaction_ref.trim();
    if reference.is_empty() {
        return Err(ElimuError::Validation(
            "Transaction reference is required.".to_string(),
        ));
    }

    let student = get_student_by_admission(&state.pool, &input.admission_number).await?;

    // Pre-check for the duplicate-reference message; the unique constraint
    // is the backstop under concurrency.
    let duplicate: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM fee_payments WHERE transaction_reference = $1",
    )
    .bind(reference)
    .fetch_one(&state.pool)
    .await?;
    if duplicate.0 > 0 {
        return Err(ElimuError::Conflict(format!(
            "A payment with reference {} has already been recorded.",
            reference
        )));
    }

    let payment_date = input
        .payment_date
        .as_deref()
        .and_then(parse_date_safe)
        .unwrap_or_else(|| Local::now().date_naive());

    let mut payment = sqlx::query_as::<_, FeePayment>(
        "INSERT INTO fee_payments
            (student_id, academic_year, session, amount, payment_method,
             transaction_reference, payment_date, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'COMPLETED')
         RETURNING *",
    )
    .bind(student.id)
    .bind(&input.academic_year)
    .bind(&input.session)
    .bind(input.amount)
    .bind(&input.payment_method)
    .bind(reference)
    .bind(payment_date)
    .fetch_one(&state.pool)
    .await?;

    payment.admission_number = Some(student.admission_number.clone());
    payment.student_name = Some(format!("{} {}", student.first_name, student.last_name));

    tracing::info!(
        "Recorded payment {} of {} for {}",
        payment.transaction_reference,
        payment.amount,
        student.admission_number
    );

    Ok(Json(payment))
}

pub async fn get_student_payments(
    State(state): State<AppState>,
    Query(query): Query<AdmissionNumberQuery>,
) -> ElimuResult<Json<Vec<FeePayment>>> {
    let student = get_student_by_admission(&state.pool, &query.admission_number).await?;

    let payments = sqlx::query_as::<_, FeePayment>(
        "SELECT fp.*, s.admission_number,
                s.first_name || ' ' || s.last_name AS student_name
         FROM fee_payments fp
         JOIN students s ON fp.student_id = s.id
         WHERE fp.student_id = $1
         ORDER BY fp.payment_date DESC, fp.id DESC",
    )
    .bind(student.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(payments))
}

pub async fn get_fee_structures(
    State(state): State<AppState>,
) -> ElimuResult<Json<Vec<FeeStructure>>> {
    let structures = sqlx::query_as::<_, FeeStructure>(
        "SELECT fs.*, p.name AS programme_name
         FROM fee_structures fs
         JOIN programmes p ON fs.programme_id = p.id
         ORDER BY fs.academic_year DESC, p.name, fs.session",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(structures))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeStructureInput {
    pub id: Option<i32>,
    pub programme_id: i32,
    pub academic_year: String,
    pub session: String,
    pub total_fee: i64,
    pub tuition_fee: i64,
    pub exam_fee: i64,
    pub library_fee: i64,
    pub activity_fee: i64,
    pub is_active: Option<bool>,
}

pub async fn save_fee_structure(
    State(state): State<AppState>,
    Json(input): Json<FeeStructureInput>,
) -> ElimuResult<Json<Value>> {
    if let Some(id) = input.id {
        sqlx::query(
            "UPDATE fee_structures SET programme_id=$1, academic_year=$2, session=$3,
                total_fee=$4, tuition_fee=$5, exam_fee=$6, library_fee=$7, activity_fee=$8,
                is_active=$9
             WHERE id=$10",
        )
        .bind(input.programme_id)
        .bind(&input.academic_year)
        .bind(&input.session)
        .bind(input.total_fee)
        .bind(input.tuition_fee)
        .bind(input.exam_fee)
        .bind(input.library_fee)
        .bind(input.activity_fee)
        .bind(input.is_active.unwrap_or(true))
        .bind(id)
        .execute(&state.pool)
        .await?;
    } else {
        sqlx::query(
            "INSERT INTO fee_structures
                (programme_id, academic_year, session, total_fee, tuition_fee,
                 exam_fee, library_fee, activity_fee, is_active)
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
        )
        .bind(input.programme_id)
        .bind(&input.academic_year)
        .bind(&input.session)
        .bind(input.total_fee)
        .bind(input.tuition_fee)
        .bind(input.exam_fee)
        .bind(input.library_fee)
        .bind(input.activity_fee)
        .bind(input.is_active.unwrap_or(true))
        .execute(&state.pool)
        .await?;
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StkPushInput {
    pub phone: String,
    pub amount: i64,
}

/// The M-PESA integration never left the mock stage in the source system:
/// no network call is made, the caller gets canned acceptance data.
pub async fn initiate_mpesa_stk_push(
    Json(input): Json<StkPushInput>,
) -> ElimuResult<Json<Value>> {
    if input.phone.trim().is_empty() || input.amount <= 0 {
        return Err(ElimuError::Validation(
            "Phone number and a positive amount are required.".to_string(),
        ));
    }

    let mock_id = uuid::Uuid::new_v4().to_string().to_uppercase();
    Ok(Json(json!({
        "merchantRequestId": format!("MOCK-{}", &mock_id[..8]),
        "checkoutRequestId": format!("ws_CO_{}", &mock_id[..12]),
        "responseDescription": "Success. Request accepted for processing (mock)",
        "customerMessage": "This deployment uses a mock M-PESA gateway."
    })))
}
