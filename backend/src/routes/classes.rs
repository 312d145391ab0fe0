use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/classes", get(commands::classes::get_classes))
        .route("/api/classes/save", post(commands::classes::save_class))
        .route("/api/classes/delete", post(commands::classes::delete_class))
}
