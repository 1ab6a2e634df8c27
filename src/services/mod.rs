pub mod access;
pub mod availability;
pub mod booking;
pub mod calendar;
pub mod datetime;
pub mod notify;
