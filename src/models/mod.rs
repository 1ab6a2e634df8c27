pub mod appointment;
pub mod availability;
pub mod pet;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus, DEFAULT_DURATION_MINUTES};
pub use availability::{Availability, SlotOption, SlotTemplate};
pub use pet::Pet;
pub use user::{Role, User};
