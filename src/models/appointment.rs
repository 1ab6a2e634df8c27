use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Length assumed for an appointment stored without a duration.
pub const DEFAULT_DURATION_MINUTES: i32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub pet_id: String,
    pub provider_id: String,
    /// Clinic wall-clock time, never timezone-converted.
    pub start_date_time: NaiveDateTime,
    pub duration_minutes: Option<i32>,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn date(&self) -> NaiveDate {
        self.start_date_time.date()
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_date_time.time()
    }

    pub fn effective_duration(&self) -> i32 {
        self.duration_minutes
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DURATION_MINUTES)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::InProgress => "IN_PROGRESS",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SCHEDULED" => Some(AppointmentStatus::Scheduled),
            "CONFIRMED" => Some(AppointmentStatus::Confirmed),
            "IN_PROGRESS" => Some(AppointmentStatus::InProgress),
            "COMPLETED" => Some(AppointmentStatus::Completed),
            "CANCELLED" => Some(AppointmentStatus::Cancelled),
            "NO_SHOW" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }

    /// Active appointments occupy their slot; cancelled and no-show ones don't.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    /// Whether the appointment can still be moved to another time.
    pub fn is_open(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }
}
