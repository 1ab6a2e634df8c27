pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::Appointment;
use crate::services::datetime;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AppointmentBooked,
    AppointmentRescheduled,
    AppointmentCancelled,
    AppointmentStatusChanged,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub appointment_id: String,
    pub pet_id: String,
    pub provider_id: String,
    pub date: String,
    pub time: String,
    pub status: String,
}

impl Notification {
    pub fn for_appointment(kind: NotificationKind, appt: &Appointment) -> Self {
        Self {
            kind,
            appointment_id: appt.id.clone(),
            pet_id: appt.pet_id.clone(),
            provider_id: appt.provider_id.clone(),
            date: datetime::storage_date(appt.date()),
            time: datetime::slot_value(appt.start_time()),
            status: appt.status.as_str().to_string(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Writes notifications to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        tracing::info!(
            kind = ?notification.kind,
            appointment_id = %notification.appointment_id,
            date = %notification.date,
            time = %notification.time,
            "notification"
        );
        Ok(())
    }
}

/// Sends a notification, logging instead of failing when delivery breaks.
pub async fn dispatch(notifier: &dyn Notifier, kind: NotificationKind, appt: &Appointment) {
    let notification = Notification::for_appointment(kind, appt);
    if let Err(e) = notifier.notify(&notification).await {
        tracing::warn!(error = %e, appointment_id = %appt.id, "failed to deliver notification");
    }
}
