use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/students/search", get(commands::students::search_students))
        .route("/api/students/details", get(commands::students::get_student_details))
        .route("/api/students/create", post(commands::students::create_student))
        .route("/api/students/update", post(commands::students::update_student))
        .route("/api/students/delete", post(commands::students::delete_student))
}
