use std::env;

use chrono::NaiveTime;

use crate::services::datetime;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub clinic_name: String,
    pub schedule: ScheduleConfig,
    pub session_ttl_hours: i64,
    pub notify_webhook_url: Option<String>,
    pub notify_webhook_secret: String,
}

/// Daily slot template: every `slot_minutes` from `open` through `close` inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduleConfig {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub slot_minutes: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            slot_minutes: 30,
        }
    }
}

impl ScheduleConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        let open = env_time("CLINIC_OPEN").unwrap_or(defaults.open);
        let close = env_time("CLINIC_CLOSE").unwrap_or(defaults.close);
        let slot_minutes = env::var("SLOT_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|m| (5..=240).contains(m))
            .unwrap_or(defaults.slot_minutes);

        if close < open {
            tracing::warn!(%open, %close, "CLINIC_CLOSE is before CLINIC_OPEN, using default hours");
            return Self {
                slot_minutes,
                ..defaults
            };
        }

        Self {
            open,
            close,
            slot_minutes,
        }
    }
}

fn env_time(key: &str) -> Option<NaiveTime> {
    let raw = env::var(key).ok()?;
    match datetime::parse_time(&raw) {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "ignoring invalid clinic hour");
            None
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "vetclinic.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            clinic_name: env::var("CLINIC_NAME").unwrap_or_else(|_| "Vet Clinic".to_string()),
            schedule: ScheduleConfig::from_env(),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h| *h > 0)
                .unwrap_or(24),
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            notify_webhook_secret: env::var("NOTIFY_WEBHOOK_SECRET").unwrap_or_default(),
        }
    }
}
