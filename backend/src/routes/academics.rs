use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/academics/attendance/record",
            post(commands::academics::record_attendance),
        )
        .route(
            "/api/academics/attendance/summary/:student_id",
            get(commands::academics::get_attendance_summary),
        )
        .route(
            "/api/academics/attendance/class",
            get(commands::academics::get_class_attendance),
        )
        .route("/api/academics/subjects", get(commands::academics::get_subjects))
        .route(
            "/api/academics/subjects/save",
            post(commands::academics::save_subject),
        )
        .route(
            "/api/academics/registrations/create",
            post(commands::academics::register_subject),
        )
        .route(
            "/api/academics/registrations/student/:student_id",
            get(commands::academics::get_student_registrations),
        )
        .route("/api/academics/marks/save", post(commands::academics::save_marks))
        .route(
            "/api/academics/marks/student/:student_id",
            get(commands::academics::get_student_marks),
        )
        .route(
            "/api/academics/exams/save",
            post(commands::academics::save_exam_schedule),
        )
        .route(
            "/api/academics/exams/delete",
            post(commands::academics::delete_exam_schedule),
        )
        .route(
            "/api/academics/exams/class/:class_id",
            get(commands::academics::get_class_exam_schedules),
        )
        .route(
            "/api/academics/exams/results/record",
            post(commands::academics::record_exam_result),
        )
        .route(
            "/api/academics/exams/results/student/:student_id",
            get(commands::academics::get_student_exam_results),
        )
}
