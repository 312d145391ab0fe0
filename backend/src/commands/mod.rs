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
pub mod utils;
