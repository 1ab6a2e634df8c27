use chrono::{Duration, NaiveTime};
use serde::Serialize;

use crate::config::ScheduleConfig;
use crate::services::datetime;

/// Fixed daily list of candidate start times.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotTemplate {
    pub slots: Vec<NaiveTime>,
    pub slot_minutes: u32,
}

impl SlotTemplate {
    /// Every `slot_minutes` from `open` through `close`, both ends included.
    pub fn build(open: NaiveTime, close: NaiveTime, slot_minutes: u32) -> Self {
        let mut slots = Vec::new();
        if slot_minutes == 0 {
            return Self { slots, slot_minutes };
        }

        let step = Duration::minutes(slot_minutes as i64);
        let mut current = open;
        while current <= close {
            slots.push(current);
            let (next, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 || next <= current {
                break;
            }
            current = next;
        }

        Self { slots, slot_minutes }
    }

    pub fn from_schedule(schedule: &ScheduleConfig) -> Self {
        Self::build(schedule.open, schedule.close, schedule.slot_minutes)
    }

    /// Builds a template from explicit `HH:MM` values.
    pub fn from_values(values: &[&str], slot_minutes: u32) -> anyhow::Result<Self> {
        let slots = values
            .iter()
            .map(|v| datetime::parse_time(v))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { slots, slot_minutes })
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        self.slots.contains(&t)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotOption {
    pub value: String,
    pub label: String,
}

impl SlotOption {
    pub fn from_time(t: NaiveTime) -> Self {
        Self {
            value: datetime::slot_value(t),
            label: datetime::slot_label(t),
        }
    }
}

/// Bookable slots for one provider on one date.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub available_slots: Vec<SlotOption>,
    pub total_slots: usize,
    pub booked_slots: usize,
    pub available_count: usize,
}

impl Availability {
    pub fn values(&self) -> Vec<&str> {
        self.available_slots.iter().map(|s| s.value.as_str()).collect()
    }
}
