use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Appointment, AppointmentStatus, Pet, Role, SlotTemplate, User};
use crate::services::availability::overlaps;
use crate::services::datetime::{self, minutes_since_midnight};

pub const MAX_DURATION_MINUTES: i32 = 480;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("pet not found")]
    PetNotFound,

    #[error("appointment not found")]
    AppointmentNotFound,

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("you can only manage appointments for your own pets")]
    NotOwner,

    #[error("duration must be between 1 and 480 minutes, got {0}")]
    InvalidDuration(i32),

    #[error("{0} is not a bookable time")]
    OffTemplate(String),

    #[error("status cannot be set to {0}")]
    InvalidStatus(&'static str),

    #[error("that time slot is already booked")]
    Conflict,

    #[error("a {0} appointment cannot be changed")]
    NotReschedulable(&'static str),

    #[error("a {0} appointment cannot be cancelled")]
    NotCancellable(&'static str),

    #[error("appointment is already cancelled")]
    AlreadyCancelled,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub pet_id: String,
    pub provider_id: String,
    pub start: NaiveDateTime,
    pub duration_minutes: Option<i32>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Rejects the proposed interval if it overlaps an active appointment of the
/// same provider on the same date. `ignore_id` excludes the appointment being moved.
pub fn check_conflict(
    conn: &Connection,
    provider_id: &str,
    start: &NaiveDateTime,
    duration_minutes: i32,
    ignore_id: Option<&str>,
) -> Result<(), BookingError> {
    let existing = queries::find_appointments_by_date(conn, start.date())?;

    let proposed_start = minutes_since_midnight(start.time());
    let proposed_end = proposed_start + duration_minutes as u32;

    for appt in existing
        .iter()
        .filter(|a| a.provider_id == provider_id && a.is_active())
        .filter(|a| Some(a.id.as_str()) != ignore_id)
    {
        let appt_start = minutes_since_midnight(appt.start_time());
        let appt_end = appt_start + appt.effective_duration() as u32;
        if overlaps(proposed_start, proposed_end, appt_start, appt_end) {
            tracing::info!(
                provider_id,
                existing = %appt.id,
                start = %datetime::to_storage(start),
                "booking conflict"
            );
            return Err(BookingError::Conflict);
        }
    }

    Ok(())
}

fn load_pet_for(conn: &Connection, actor: &User, pet_id: &str) -> Result<Pet, BookingError> {
    let pet = queries::get_pet(conn, pet_id)?.ok_or(BookingError::PetNotFound)?;
    if actor.role == Role::Customer && pet.owner_id != actor.id {
        return Err(BookingError::NotOwner);
    }
    Ok(pet)
}

/// Loads an appointment, refusing customers who don't own the pet.
pub fn find_for_actor(
    conn: &Connection,
    actor: &User,
    id: &str,
) -> Result<Appointment, BookingError> {
    let appt = queries::get_appointment_by_id(conn, id)?.ok_or(BookingError::AppointmentNotFound)?;
    load_pet_for(conn, actor, &appt.pet_id)?;
    Ok(appt)
}

fn ensure_bookable_time(template: &SlotTemplate, start: &NaiveDateTime) -> Result<(), BookingError> {
    if !template.contains(start.time()) {
        return Err(BookingError::OffTemplate(datetime::slot_value(start.time())));
    }
    Ok(())
}

/// Creates a SCHEDULED appointment. The caller must hold the connection for
/// the whole call so the conflict check and the insert cannot interleave with
/// another booking.
pub fn book(
    conn: &Connection,
    actor: &User,
    template: &SlotTemplate,
    req: BookingRequest,
) -> Result<Appointment, BookingError> {
    load_pet_for(conn, actor, &req.pet_id)?;

    let provider = queries::get_user(conn, &req.provider_id)?
        .filter(|u| u.role == Role::Veterinarian)
        .ok_or_else(|| BookingError::UnknownProvider(req.provider_id.clone()))?;

    let duration = req.duration_minutes.unwrap_or(template.slot_minutes as i32);
    if !(1..=MAX_DURATION_MINUTES).contains(&duration) {
        return Err(BookingError::InvalidDuration(duration));
    }
    ensure_bookable_time(template, &req.start)?;
    check_conflict(conn, &provider.id, &req.start, duration, None)?;

    let now = Utc::now().naive_utc();
    let appt = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        pet_id: req.pet_id,
        provider_id: provider.id,
        start_date_time: req.start,
        duration_minutes: Some(duration),
        status: AppointmentStatus::Scheduled,
        reason: req.reason,
        notes: req.notes,
        created_at: now,
        updated_at: now,
    };
    queries::create_appointment(conn, &appt)?;

    tracing::info!(
        appointment_id = %appt.id,
        provider_id = %appt.provider_id,
        start = %datetime::to_storage(&appt.start_date_time),
        "appointment booked"
    );
    Ok(appt)
}

pub fn reschedule(
    conn: &Connection,
    actor: &User,
    template: &SlotTemplate,
    id: &str,
    new_start: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    let mut appt = find_for_actor(conn, actor, id)?;
    if !appt.status.is_open() {
        return Err(BookingError::NotReschedulable(appt.status.as_str()));
    }

    ensure_bookable_time(template, &new_start)?;
    check_conflict(
        conn,
        &appt.provider_id,
        &new_start,
        appt.effective_duration(),
        Some(&appt.id),
    )?;

    queries::reschedule_appointment(conn, &appt.id, &new_start)?;
    tracing::info!(
        appointment_id = %appt.id,
        from = %datetime::to_storage(&appt.start_date_time),
        to = %datetime::to_storage(&new_start),
        "appointment rescheduled"
    );

    appt.start_date_time = new_start;
    appt.updated_at = Utc::now().naive_utc();
    Ok(appt)
}

pub fn cancel(conn: &Connection, actor: &User, id: &str) -> Result<Appointment, BookingError> {
    let mut appt = find_for_actor(conn, actor, id)?;
    match appt.status {
        AppointmentStatus::Cancelled => return Err(BookingError::AlreadyCancelled),
        AppointmentStatus::Completed | AppointmentStatus::NoShow | AppointmentStatus::InProgress => {
            return Err(BookingError::NotCancellable(appt.status.as_str()))
        }
        AppointmentStatus::Scheduled | AppointmentStatus::Confirmed => {}
    }

    queries::update_appointment_status(conn, &appt.id, AppointmentStatus::Cancelled)?;
    tracing::info!(appointment_id = %appt.id, "appointment cancelled");

    appt.status = AppointmentStatus::Cancelled;
    appt.updated_at = Utc::now().naive_utc();
    Ok(appt)
}

/// Staff transitions: CONFIRMED, IN_PROGRESS, COMPLETED, NO_SHOW.
pub fn set_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> Result<Appointment, BookingError> {
    if matches!(status, AppointmentStatus::Scheduled | AppointmentStatus::Cancelled) {
        return Err(BookingError::InvalidStatus(status.as_str()));
    }

    let mut appt = queries::get_appointment_by_id(conn, id)?.ok_or(BookingError::AppointmentNotFound)?;
    if appt.status == AppointmentStatus::Cancelled {
        return Err(BookingError::AlreadyCancelled);
    }

    // A no-show brought back to an active state takes its slot again.
    if !appt.is_active() && status.is_active() {
        check_conflict(
            conn,
            &appt.provider_id,
            &appt.start_date_time,
            appt.effective_duration(),
            Some(&appt.id),
        )?;
    }

    queries::update_appointment_status(conn, &appt.id, status)?;
    tracing::info!(appointment_id = %appt.id, status = status.as_str(), "appointment status updated");

    appt.status = status;
    appt.updated_at = Utc::now().naive_utc();
    Ok(appt)
}
