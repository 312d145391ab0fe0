use crate::commands;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/overview", get(commands::dashboard::get_dashboard_overview))
        .route("/api/dashboard/gender", get(commands::dashboard::get_gender_breakdown))
        .route(
            "/api/dashboard/departments",
            get(commands::dashboard::get_department_population),
        )
        .route(
            "/api/dashboard/registrations",
            get(commands::dashboard::get_subject_registration_counts),
        )
        .route(
            "/api/dashboard/activity",
            get(commands::dashboard::get_record_activity_counts),
        )
        .route(
            "/api/dashboard/applicants",
            get(commands::dashboard::get_applicants_by_gender),
        )
}
