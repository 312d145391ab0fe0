#[cfg(test)]
mod tests {
    use axum::extract::{Extension, Json, Query, State};

    use crate::commands::fees::{balance_for_student, record_fee_payment, RecordPaymentInput};
    use crate::commands::procurement::{
        create_procurement_request, update_procurement_status, ProcurementInput,
        ProcurementStatusInput,
    };
    use crate::commands::programmes::{delete_programme, ProgrammeDeleteInput};
    use crate::commands::students::{
        get_student_by_admission, search_students, StudentSearchParams,
    };
    use crate::db::{self, DbPool};
    use crate::error::ElimuError;
    use crate::middleware::auth::Claims;
    use crate::state::AppState;

    async fn setup_test_db() -> DbPool {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = db::init_pool(&database_url)
            .await
            .expect("Failed to create pool");
        db::init_database(&pool).await.expect("Failed to migrate");
        pool
    }

    fn unique_suffix() -> String {
        uuid::Uuid::new_v4().to_string()[..8].to_uppercase()
    }

    /// department -> programme -> student, with a 60000 fee structure.
    async fn seed_student(pool: &DbPool, tag: &str) -> (i32, i32, String) {
        let dept_id: i32 = sqlx::query_scalar(
            "INSERT INTO departments (name, code) VALUES ($1, $2) RETURNING id",
        )
        .bind(format!("Test Department {}", tag))
        .bind(format!("TD-{}", tag))
        .fetch_one(pool)
        .await
        .unwrap();

        let prog_id: i32 = sqlx::query_scalar(
            "INSERT INTO programmes (name, code, department_id, level, duration_months)
             VALUES ($1, $2, $3, 'DIPLOMA', 36) RETURNING id",
        )
        .bind(format!("Test Programme {}", tag))
        .bind(format!("TP-{}", tag))
        .bind(dept_id)
        .fetch_one(pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO fee_structures (programme_id, academic_year, session, total_fee, tuition_fee)
             VALUES ($1, '2025/2026', 'SEPT_DEC', 60000, 60000)",
        )
        .bind(prog_id)
        .execute(pool)
        .await
        .unwrap();

        let admission = format!("ADM-{}", tag);
        sqlx::query(
            "INSERT INTO students (admission_number, first_name, last_name, gender,
                programme_id, department_id, academic_status, session, academic_year)
             VALUES ($1, 'Test', 'Student', 'MALE', $2, $3, 'ACTIVE', 'SEPT_DEC', '2025/2026')",
        )
        .bind(&admission)
        .bind(prog_id)
        .bind(dept_id)
        .execute(pool)
        .await
        .unwrap();

        (dept_id, prog_id, admission)
    }

    async fn cleanup_student(pool: &DbPool, dept_id: i32, prog_id: i32, admission: &str) {
        let _ = sqlx::query(
            "DELETE FROM fee_payments WHERE student_id IN
                (SELECT id FROM students WHERE admission_number = $1)",
        )
        .bind(admission)
        .execute(pool)
        .await;
        let _ = sqlx::query("DELETE FROM students WHERE admission_number = $1")
            .bind(admission)
            .execute(pool)
            .await;
        let _ = sqlx::query("DELETE FROM fee_structures WHERE programme_id = $1")
            .bind(prog_id)
            .execute(pool)
            .await;
        let _ = sqlx::query("DELETE FROM programmes WHERE id = $1")
            .bind(prog_id)
            .execute(pool)
            .await;
        let _ = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(dept_id)
            .execute(pool)
            .await;
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_record_payment_and_balance_integration() {
        let pool = setup_test_db().await;
        let state = AppState { pool: pool.clone() };
        let tag = unique_suffix();
        let (dept_id, prog_id, admission) = seed_student(&pool, &tag).await;

        let reference = format!("MPESA-{}", tag);
        let input = RecordPaymentInput {
            admission_number: admission.clone(),
            academic_year: "2025/2026".to_string(),
            session: "SEPT_DEC".to_string(),
            amount: 25000,
            payment_method: "MPESA".to_string(),
            transaction_ref: reference.clone(),
            payment_date: Some("2025-09-15".to_string()),
        };

        let payment = record_fee_payment(State(state.clone()), Json(input))
            .await
            .expect("payment should be recorded")
            .0;
        assert_eq!(payment.amount, 25000);
        assert_eq!(payment.status, "COMPLETED");
        assert_eq!(payment.admission_number.as_deref(), Some(admission.as_str()));

        // Same reference again must be refused and leave a single row behind.
        let duplicate = RecordPaymentInput {
            admission_number: admission.clone(),
            academic_year: "2025/2026".to_string(),
            session: "SEPT_DEC".to_string(),
            amount: 10000,
            payment_method: "CASH".to_string(),
            transaction_ref: reference.clone(),
            payment_date: None,
        };
        let err = record_fee_payment(State(state.clone()), Json(duplicate))
            .await
            .expect_err("duplicate reference must fail");
        assert!(matches!(err, ElimuError::Conflict(_)), "got {:?}", err);

        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM fee_payments WHERE transaction_reference = $1")
                .bind(&reference)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count.0, 1);

        // Balance reads the same on repeated calls with no writes in between.
        let student = get_student_by_admission(&pool, &admission).await.unwrap();
        let first = balance_for_student(&pool, &student).await.unwrap();
        let second = balance_for_student(&pool, &student).await.unwrap();
        assert_eq!(first.total_fee, 60000);
        assert_eq!(first.total_paid, 25000);
        assert_eq!(first.balance, 35000);
        assert_eq!(second.balance, first.balance);

        // Overpayment is reported as a negative balance, not rejected.
        let overpay = RecordPaymentInput {
            admission_number: admission.clone(),
            academic_year: "2025/2026".to_string(),
            session: "SEPT_DEC".to_string(),
            amount: 50000,
            payment_method: "BANK".to_string(),
            transaction_ref: format!("BANK-{}", tag),
            payment_date: None,
        };
        record_fee_payment(State(state.clone()), Json(overpay))
            .await
            .expect("overpayment is accepted");
        let after = balance_for_student(&pool, &student).await.unwrap();
        assert_eq!(after.balance, -15000);

        cleanup_student(&pool, dept_id, prog_id, &admission).await;
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_multi_word_search_integration() {
        let pool = setup_test_db().await;
        let state = AppState { pool: pool.clone() };
        let tag = unique_suffix();
        let (dept_id, prog_id, admission) = seed_student(&pool, &tag).await;

        // Matching student: both tokens hit a name field each.
        let match_adm = format!("ADM-M-{}", tag);
        sqlx::query(
            "INSERT INTO students (admission_number, first_name, last_name, gender,
                programme_id, department_id, academic_status, session, academic_year)
             VALUES ($1, $2, $3, 'MALE', $4, $5, 'ACTIVE', 'SEPT_DEC', '2025/2026')",
        )
        .bind(&match_adm)
        .bind(format!("KEMBOI{}", tag))
        .bind(format!("WASIKE{}", tag))
        .bind(prog_id)
        .bind(dept_id)
        .execute(&pool)
        .await
        .unwrap();

        // Near miss: only one of the two tokens matches any name field.
        let miss_adm = format!("ADM-N-{}", tag);
        sqlx::query(
            "INSERT INTO students (admission_number, first_name, last_name, gender,
                programme_id, department_id, academic_status, session, academic_year)
             VALUES ($1, $2, 'OTHER', 'FEMALE', $3, $4, 'ACTIVE', 'SEPT_DEC', '2025/2026')",
        )
        .bind(&miss_adm)
        .bind(format!("WASIKE{}", tag))
        .bind(prog_id)
        .bind(dept_id)
        .execute(&pool)
        .await
        .unwrap();

        let params = StudentSearchParams {
            search: Some(format!("WASIKE{} KEMBOI{}", tag, tag)),
            ..Default::default()
        };
        let body = search_students(State(state), Query(params))
            .await
            .expect("search should succeed")
            .0;

        let rows = body["data"].as_array().expect("data array");
        assert_eq!(rows.len(), 1, "only the full-name match should survive");
        assert_eq!(rows[0]["admissionNumber"], match_adm.as_str());

        for adm in [&match_adm, &miss_adm] {
            let _ = sqlx::query("DELETE FROM students WHERE admission_number = $1")
                .bind(adm)
                .execute(&pool)
                .await;
        }
        cleanup_student(&pool, dept_id, prog_id, &admission).await;
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_programme_delete_guard_integration() {
        let pool = setup_test_db().await;
        let state = AppState { pool: pool.clone() };
        let tag = unique_suffix();
        let (dept_id, prog_id, admission) = seed_student(&pool, &tag).await;

        let err = delete_programme(
            State(state),
            Json(ProgrammeDeleteInput { id: prog_id }),
        )
        .await
        .expect_err("delete must be refused while students are enrolled");
        assert!(matches!(err, ElimuError::Validation(_)), "got {:?}", err);

        let still_there: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM programmes WHERE id = $1")
                .bind(prog_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(still_there.0, 1, "guarded delete must not remove the row");

        cleanup_student(&pool, dept_id, prog_id, &admission).await;
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_procurement_lifecycle_integration() {
        let pool = setup_test_db().await;
        let state = AppState { pool: pool.clone() };
        let tag = unique_suffix();

        let dept_id: i32 = sqlx::query_scalar(
            "INSERT INTO departments (name, code) VALUES ($1, $2) RETURNING id",
        )
        .bind(format!("Proc Department {}", tag))
        .bind(format!("PD-{}", tag))
        .fetch_one(&pool)
        .await
        .unwrap();

        let user_id: i32 = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash, first_name, last_name, role)
             VALUES ($1, 'x', 'Proc', 'Admin', 'ADMIN') RETURNING id",
        )
        .bind(format!("proc-{}@elimu.ac.ke", tag.to_lowercase()))
        .fetch_one(&pool)
        .await
        .unwrap();

        let claims = Claims {
            sub: user_id,
            email: format!("proc-{}@elimu.ac.ke", tag.to_lowercase()),
            role: "ADMIN".to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };

        let request = create_procurement_request(
            State(state.clone()),
            Extension(claims.clone()),
            Json(ProcurementInput {
                department_id: dept_id,
                item: "Laboratory stools".to_string(),
                quantity: Some(20),
                estimated_cost: 80000,
                justification: None,
            }),
        )
        .await
        .expect("request should be created")
        .0;
        assert_eq!(request.status, "PENDING");
        assert!(request.request_number.starts_with("PR/"));

        // PENDING cannot jump straight to COMPLETED.
        let err = update_procurement_status(
            State(state.clone()),
            Extension(claims.clone()),
            Json(ProcurementStatusInput {
                id: request.id,
                status: "COMPLETED".to_string(),
            }),
        )
        .await
        .expect_err("illegal transition must fail");
        assert!(matches!(err, ElimuError::Validation(_)), "got {:?}", err);

        for status in ["APPROVED", "IN_PROGRESS", "COMPLETED"] {
            update_procurement_status(
                State(state.clone()),
                Extension(claims.clone()),
                Json(ProcurementStatusInput {
                    id: request.id,
                    status: status.to_string(),
                }),
            )
            .await
            .unwrap_or_else(|e| panic!("transition to {} failed: {:?}", status, e));
        }

        let (status, approved_by): (String, Option<i32>) = sqlx::query_as(
            "SELECT status, approved_by FROM procurement_requests WHERE id = $1",
        )
        .bind(request.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(status, "COMPLETED");
        assert_eq!(approved_by, Some(user_id));

        let _ = sqlx::query("DELETE FROM procurement_requests WHERE id = $1")
            .bind(request.id)
            .execute(&pool)
            .await;
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&pool)
            .await;
        let _ = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(dept_id)
            .execute(&pool)
            .await;
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_inactive_user_login_integration() {
        use crate::commands::auth::{login, LoginRequest};
        use axum_extra::extract::cookie::CookieJar;

        let pool = setup_test_db().await;
        let state = AppState { pool: pool.clone() };
        let tag = unique_suffix();
        let email = format!("inactive-{}@elimu.ac.ke", tag.to_lowercase());

        let hash = bcrypt::hash("correct-password", bcrypt::DEFAULT_COST).unwrap();
        let user_id: i32 = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash, first_name, last_name, role, is_active)
             VALUES ($1, $2, 'Former', 'Staff', 'STAFF', FALSE) RETURNING id",
        )
        .bind(&email)
        .bind(hash)
        .fetch_one(&pool)
        .await
        .unwrap();

        // Correct password, deactivated account: 403 and no cookie issued.
        let err = login(
            State(state),
            CookieJar::new(),
            Json(LoginRequest {
                email: email.clone(),
                password: "correct-password".to_string(),
            }),
        )
        .await
        .expect_err("inactive account must not log in");
        assert!(matches!(err, ElimuError::Forbidden(_)), "got {:?}", err);

        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&pool)
            .await;
    }
}
