use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::handlers::auth::{current_user, require};
use crate::models::{Appointment, AppointmentStatus, SlotOption};
use crate::services::access::{self, Action};
use crate::services::notify::{self, NotificationKind};
use crate::services::{availability, booking, datetime};
use crate::state::AppState;

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

fn parse_date_param(raw: &str) -> Result<chrono::NaiveDate, AppError> {
    datetime::parse_date(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn parse_start(date: &str, time: &str) -> Result<chrono::NaiveDateTime, AppError> {
    let date = parse_date_param(date)?;
    let time = datetime::parse_time(time).map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(datetime::combine(date, time))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    id: String,
    pet_id: String,
    provider_id: String,
    date: String,
    time: String,
    label: String,
    duration_minutes: i32,
    status: AppointmentStatus,
    reason: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        let slot = SlotOption::from_time(a.start_time());
        Self {
            date: datetime::storage_date(a.date()),
            time: slot.value,
            label: slot.label,
            duration_minutes: a.effective_duration(),
            created_at: datetime::to_storage(&a.created_at),
            updated_at: datetime::to_storage(&a.updated_at),
            id: a.id,
            pet_id: a.pet_id,
            provider_id: a.provider_id,
            status: a.status,
            reason: a.reason,
            notes: a.notes,
        }
    }
}

#[derive(Serialize)]
pub struct AppointmentEnvelope {
    success: bool,
    appointment: AppointmentResponse,
}

impl From<Appointment> for AppointmentEnvelope {
    fn from(a: Appointment) -> Self {
        Self {
            success: true,
            appointment: a.into(),
        }
    }
}

// GET /api/appointments/available-times
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTimesQuery {
    pub date: Option<String>,
    pub provider_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTimesResponse {
    success: bool,
    available_slots: Vec<SlotOption>,
    total_slots: usize,
    booked_slots: usize,
    available_count: usize,
}

pub async fn available_times(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AvailableTimesQuery>,
) -> Result<Json<AvailableTimesResponse>, AppError> {
    let user = current_user(&state, &headers)?;
    require(&user, Action::ViewAvailability)?;

    let date = parse_date_param(required(&query.date, "date")?)?;
    let provider_id = required(&query.provider_id, "providerId")?;

    let result = {
        let conn = db::lock(&state.db)?;
        availability::available_times(&conn, date, provider_id, &state.template)?
    };

    Ok(Json(AvailableTimesResponse {
        success: true,
        available_slots: result.available_slots,
        total_slots: result.total_slots,
        booked_slots: result.booked_slots,
        available_count: result.available_count,
    }))
}

// GET /api/appointments
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub date: Option<String>,
    pub provider_id: Option<String>,
    pub pet_id: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = current_user(&state, &headers)?;

    let date = match query.date.as_deref().filter(|d| !d.is_empty()) {
        Some(raw) => Some(parse_date_param(raw)?),
        None => None,
    };
    let filter = queries::AppointmentFilter {
        date,
        provider_id: query.provider_id,
        pet_id: query.pet_id,
        owner_id: (!access::can(user.role, Action::ViewAllAppointments)).then(|| user.id.clone()),
        limit: query.limit.unwrap_or(100).clamp(1, 500),
    };

    let appointments = {
        let conn = db::lock(&state.db)?;
        queries::list_appointments(&conn, &filter)?
    };

    let items: Vec<AppointmentResponse> = appointments.into_iter().map(Into::into).collect();
    Ok(Json(serde_json::json!({ "success": true, "appointments": items })))
}

// POST /api/appointments
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub pet_id: Option<String>,
    pub provider_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentEnvelope>), AppError> {
    let user = current_user(&state, &headers)?;
    require(&user, Action::BookAppointment)?;

    let request = booking::BookingRequest {
        pet_id: required(&body.pet_id, "petId")?.to_string(),
        provider_id: required(&body.provider_id, "providerId")?.to_string(),
        start: parse_start(required(&body.date, "date")?, required(&body.time, "time")?)?,
        duration_minutes: body.duration_minutes,
        reason: body.reason,
        notes: body.notes,
    };

    let appt = {
        let conn = db::lock(&state.db)?;
        booking::book(&conn, &user, &state.template, request)?
    };
    notify::dispatch(state.notifier.as_ref(), NotificationKind::AppointmentBooked, &appt).await;

    Ok((StatusCode::CREATED, Json(appt.into())))
}

// GET /api/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AppointmentEnvelope>, AppError> {
    let user = current_user(&state, &headers)?;
    let appt = {
        let conn = db::lock(&state.db)?;
        booking::find_for_actor(&conn, &user, &id)?
    };
    Ok(Json(appt.into()))
}

// POST /api/appointments/:id/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AppointmentEnvelope>, AppError> {
    let user = current_user(&state, &headers)?;
    let appt = {
        let conn = db::lock(&state.db)?;
        booking::cancel(&conn, &user, &id)?
    };
    notify::dispatch(state.notifier.as_ref(), NotificationKind::AppointmentCancelled, &appt).await;
    Ok(Json(appt.into()))
}

// POST /api/appointments/:id/reschedule
#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub date: Option<String>,
    pub time: Option<String>,
}

pub async fn reschedule_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<AppointmentEnvelope>, AppError> {
    let user = current_user(&state, &headers)?;
    let start = parse_start(required(&body.date, "date")?, required(&body.time, "time")?)?;

    let appt = {
        let conn = db::lock(&state.db)?;
        booking::reschedule(&conn, &user, &state.template, &id, start)?
    };
    notify::dispatch(state.notifier.as_ref(), NotificationKind::AppointmentRescheduled, &appt).await;
    Ok(Json(appt.into()))
}

// POST /api/appointments/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<AppointmentEnvelope>, AppError> {
    let user = current_user(&state, &headers)?;
    require(&user, Action::ManageAppointments)?;

    let raw = required(&body.status, "status")?;
    let status = AppointmentStatus::parse(raw)
        .ok_or_else(|| AppError::BadRequest(format!("unknown status: {raw}")))?;

    let appt = {
        let conn = db::lock(&state.db)?;
        booking::set_status(&conn, &id, status)?
    };
    notify::dispatch(state.notifier.as_ref(), NotificationKind::AppointmentStatusChanged, &appt).await;
    Ok(Json(appt.into()))
}
