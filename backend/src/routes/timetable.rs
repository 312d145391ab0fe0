use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/timetable/rooms", get(commands::timetable::get_rooms))
        .route("/api/timetable/rooms/save", post(commands::timetable::save_room))
        .route("/api/timetable/rooms/delete", post(commands::timetable::delete_room))
        .route("/api/timetable/breaks", get(commands::timetable::get_break_slots))
        .route("/api/timetable/breaks/save", post(commands::timetable::save_break_slot))
        .route("/api/timetable/breaks/delete", post(commands::timetable::delete_break_slot))
        .route(
            "/api/timetable/class/:class_id",
            get(commands::timetable::get_class_timetable),
        )
        .route("/api/timetable/slots/save", post(commands::timetable::save_timetable_slot))
        .route(
            "/api/timetable/slots/delete",
            post(commands::timetable::delete_timetable_slot),
        )
}
