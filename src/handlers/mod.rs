pub mod admin;
pub mod appointments;
pub mod auth;
pub mod calendar;
pub mod directory;
pub mod health;
