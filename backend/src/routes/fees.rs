use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/fees/structures", get(commands::fees::get_fee_structures))
        .route("/api/fees/structures/save", post(commands::fees::save_fee_structure))
        .route("/api/fees/payments/record", post(commands::fees::record_fee_payment))
        .route("/api/fees/payments", get(commands::fees::get_student_payments))
        .route("/api/fees/balance", get(commands::fees::get_student_fee_balance))
        .route("/api/fees/mpesa/stk-push", post(commands::fees::initiate_mpesa_stk_push))
}
