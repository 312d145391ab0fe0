use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/procurement/create",
            post(commands::procurement::create_procurement_request),
        )
        .route(
            "/api/procurement/requests",
            get(commands::procurement::get_procurement_requests),
        )
        .route(
            "/api/procurement/status",
            post(commands::procurement::update_procurement_status),
        )
}
