pub mod attendance;
pub mod auth;
pub mod classes;
pub mod core;
pub mod exports;
pub mod grades;
pub mod reports;
pub mod setup;
pub mod students;
