use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/departments", get(commands::departments::get_departments))
        .route("/api/departments/save", post(commands::departments::save_department))
        .route("/api/departments/delete", post(commands::departments::delete_department))
}
