use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/hostel/blocks", get(commands::hostel::get_blocks))
        .route("/api/hostel/blocks/save", post(commands::hostel::save_block))
        .route(
            "/api/hostel/blocks/:block_id/floors",
            get(commands::hostel::get_block_floors),
        )
        .route("/api/hostel/floors/save", post(commands::hostel::save_floor))
        .route(
            "/api/hostel/floors/:floor_id/rooms",
            get(commands::hostel::get_floor_rooms),
        )
        .route("/api/hostel/rooms/save", post(commands::hostel::save_room))
        .route("/api/hostel/bookings/create", post(commands::hostel::create_booking))
        .route("/api/hostel/bookings/status", post(commands::hostel::update_booking_status))
        .route(
            "/api/hostel/bookings/student/:student_id",
            get(commands::hostel::get_student_bookings),
        )
        .route(
            "/api/hostel/bookings/room/:room_id",
            get(commands::hostel::get_room_bookings),
        )
}
