use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/programmes", get(commands::programmes::get_programmes))
        .route("/api/programmes/save", post(commands::programmes::save_programme))
        .route("/api/programmes/delete", post(commands::programmes::delete_programme))
}
