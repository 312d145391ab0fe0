use crate::state::AppState;
use axum::{routing::get, Router};

pub mod academics;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod departments;
pub mod fees;
pub mod hostel;
pub mod procurement;
pub mod programmes;
pub mod students;
pub mod timetable;
pub mod users;

async fn ping() -> &'static str {
    "pong"
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/ping", get(ping))
        .merge(auth::router())
        .merge(users::router())
        .merge(students::router())
        .merge(academics::router())
        .merge(fees::router())
        .merge(procurement::router())
        .merge(dashboard::router())
        .merge(timetable::router())
        .merge(hostel::router())
        .merge(departments::router())
        .merge(programmes::router())
        .merge(classes::router())
}
