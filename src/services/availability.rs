use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Appointment, Availability, SlotOption, SlotTemplate};
use crate::services::datetime::minutes_since_midnight;

/// Half-open interval overlap: touching endpoints do not overlap.
pub fn overlaps(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start < b_end && a_end > b_start
}

/// Occupied `[start, end)` minute ranges of one provider's active appointments.
fn busy_intervals(appointments: &[Appointment], provider_id: &str) -> Vec<(u32, u32)> {
    appointments
        .iter()
        .filter(|a| a.provider_id == provider_id && a.is_active())
        .map(|a| {
            let start = minutes_since_midnight(a.start_time());
            (start, start + a.effective_duration() as u32)
        })
        .collect()
}

/// Removes every template slot overlapped by an active appointment of `provider_id`.
///
/// `appointments` is expected to hold a single day's rows; the provider and
/// status filters are applied here.
pub fn compute_availability(
    appointments: &[Appointment],
    provider_id: &str,
    template: &SlotTemplate,
) -> Availability {
    let busy = busy_intervals(appointments, provider_id);

    let available_slots: Vec<SlotOption> = template
        .slots
        .iter()
        .filter(|slot| {
            let slot_start = minutes_since_midnight(**slot);
            let slot_end = slot_start + template.slot_minutes;
            !busy
                .iter()
                .any(|(start, end)| overlaps(slot_start, slot_end, *start, *end))
        })
        .map(|slot| SlotOption::from_time(*slot))
        .collect();

    let total_slots = template.len();
    let available_count = available_slots.len();

    Availability {
        available_slots,
        total_slots,
        booked_slots: total_slots - available_count,
        available_count,
    }
}

/// Loads the day's appointments and computes availability for one provider.
pub fn available_times(
    conn: &Connection,
    date: NaiveDate,
    provider_id: &str,
    template: &SlotTemplate,
) -> anyhow::Result<Availability> {
    let appointments = queries::find_appointments_by_date(conn, date)?;
    let availability = compute_availability(&appointments, provider_id, template);

    tracing::debug!(
        %date,
        provider_id,
        appointments = appointments.len(),
        available = availability.available_count,
        "computed availability"
    );

    Ok(availability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use crate::services::datetime;
    use chrono::{NaiveDateTime, Utc};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn appt(provider: &str, start: &str, duration: Option<i32>, status: AppointmentStatus) -> Appointment {
        let now = Utc::now().naive_utc();
        Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            pet_id: "pet-1".to_string(),
            provider_id: provider.to_string(),
            start_date_time: dt(start),
            duration_minutes: duration,
            status,
            reason: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn small_template() -> SlotTemplate {
        SlotTemplate::from_values(&["09:00", "09:30", "10:00", "10:30", "11:00"], 30).unwrap()
    }

    #[test]
    fn test_overlap_rule() {
        assert!(overlaps(600, 630, 600, 630));
        assert!(overlaps(600, 660, 630, 660));
        assert!(!overlaps(570, 600, 600, 630));
        assert!(!overlaps(630, 660, 600, 630));
    }

    #[test]
    fn test_single_appointment_removes_only_its_slot() {
        let appts = vec![appt("vet-1", "2024-05-28 09:30", Some(30), AppointmentStatus::Scheduled)];
        let result = compute_availability(&appts, "vet-1", &small_template());
        assert_eq!(result.values(), vec!["09:00", "10:00", "10:30", "11:00"]);
        assert_eq!(result.total_slots, 5);
        assert_eq!(result.booked_slots, 1);
        assert_eq!(result.available_count, 4);
    }

    #[test]
    fn test_hour_long_appointment_removes_two_slots() {
        let appts = vec![appt("vet-1", "2024-05-28 10:00", Some(60), AppointmentStatus::Scheduled)];
        let result = compute_availability(&appts, "vet-1", &small_template());
        assert_eq!(result.values(), vec!["09:00", "09:30", "11:00"]);
    }

    #[test]
    fn test_missing_duration_defaults_to_thirty_minutes() {
        let appts = vec![appt("vet-1", "2024-05-28 10:00", None, AppointmentStatus::Confirmed)];
        let result = compute_availability(&appts, "vet-1", &small_template());
        assert_eq!(result.values(), vec!["09:00", "09:30", "10:30", "11:00"]);
    }

    #[test]
    fn test_boundaries() {
        // 10:00-10:30 appointment: 09:30 slot ends at its start, 10:30 slot starts at its end.
        let appts = vec![appt("vet-1", "2024-05-28 10:00", Some(30), AppointmentStatus::Scheduled)];
        let result = compute_availability(&appts, "vet-1", &small_template());
        assert!(result.values().contains(&"09:30"));
        assert!(result.values().contains(&"10:30"));
        assert!(!result.values().contains(&"10:00"));
    }

    #[test]
    fn test_off_grid_appointment_blocks_both_touched_slots() {
        let appts = vec![appt("vet-1", "2024-05-28 09:45", Some(30), AppointmentStatus::Scheduled)];
        let result = compute_availability(&appts, "vet-1", &small_template());
        assert_eq!(result.values(), vec!["09:00", "10:30", "11:00"]);
    }

    #[test]
    fn test_cancelled_and_no_show_never_block() {
        let appts = vec![
            appt("vet-1", "2024-05-28 09:00", Some(30), AppointmentStatus::Cancelled),
            appt("vet-1", "2024-05-28 10:00", Some(60), AppointmentStatus::NoShow),
        ];
        let result = compute_availability(&appts, "vet-1", &small_template());
        assert_eq!(result.available_count, 5);
        assert_eq!(result.booked_slots, 0);
    }

    #[test]
    fn test_other_provider_does_not_block() {
        let appts = vec![appt("vet-2", "2024-05-28 09:00", Some(120), AppointmentStatus::Scheduled)];
        let result = compute_availability(&appts, "vet-1", &small_template());
        assert_eq!(result.available_count, 5);
    }

    #[test]
    fn test_output_is_subset_and_never_overlaps_active() {
        let template = SlotTemplate::build(datetime::parse_time("09:00").unwrap(), datetime::parse_time("17:00").unwrap(), 30);
        let appts = vec![
            appt("vet-1", "2024-05-28 09:15", Some(45), AppointmentStatus::Scheduled),
            appt("vet-1", "2024-05-28 12:00", Some(90), AppointmentStatus::InProgress),
            appt("vet-1", "2024-05-28 16:50", Some(20), AppointmentStatus::Completed),
            appt("vet-1", "2024-05-28 14:00", Some(60), AppointmentStatus::Cancelled),
            appt("vet-2", "2024-05-28 11:00", Some(30), AppointmentStatus::Scheduled),
        ];
        let result = compute_availability(&appts, "vet-1", &template);
        let busy = busy_intervals(&appts, "vet-1");

        let template_values: Vec<String> = template.slots.iter().map(|t| datetime::slot_value(*t)).collect();
        for slot in &result.available_slots {
            assert!(template_values.contains(&slot.value));
            let start = minutes_since_midnight(datetime::parse_time(&slot.value).unwrap());
            for (b_start, b_end) in &busy {
                assert!(!overlaps(start, start + 30, *b_start, *b_end), "{} overlaps", slot.value);
            }
        }
        assert_eq!(result.available_count + result.booked_slots, result.total_slots);
        // Template order is preserved.
        let mut sorted = result.values();
        sorted.sort();
        assert_eq!(sorted, result.values());
    }

    #[test]
    fn test_idempotent() {
        let appts = vec![appt("vet-1", "2024-05-28 10:00", Some(60), AppointmentStatus::Scheduled)];
        let first = compute_availability(&appts, "vet-1", &small_template());
        let second = compute_availability(&appts, "vet-1", &small_template());
        assert_eq!(first, second);
    }

    #[test]
    fn test_labels() {
        let result = compute_availability(&[], "vet-1", &SlotTemplate::from_values(&["09:00", "12:00", "13:30"], 30).unwrap());
        let labels: Vec<_> = result.available_slots.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["9:00 AM", "12:00 PM", "1:30 PM"]);
    }

    #[test]
    fn test_available_times_reads_only_requested_day() {
        use crate::db;
        use crate::models::{Pet, Role, User};

        let conn = db::init_db(":memory:").unwrap();
        queries::save_user(
            &conn,
            &User {
                id: "vet-1".to_string(),
                name: "Dr. Reyes".to_string(),
                email: "reyes@clinic.test".to_string(),
                role: Role::Veterinarian,
            },
        )
        .unwrap();
        queries::save_user(
            &conn,
            &User {
                id: "owner-1".to_string(),
                name: "Sam".to_string(),
                email: "sam@example.test".to_string(),
                role: Role::Customer,
            },
        )
        .unwrap();
        queries::create_pet(
            &conn,
            &Pet {
                id: "pet-1".to_string(),
                owner_id: "owner-1".to_string(),
                name: "Biscuit".to_string(),
                species: "dog".to_string(),
                breed: None,
            },
        )
        .unwrap();
        queries::create_appointment(&conn, &appt("vet-1", "2024-05-28 09:30", Some(30), AppointmentStatus::Scheduled)).unwrap();
        queries::create_appointment(&conn, &appt("vet-1", "2024-05-29 10:00", Some(30), AppointmentStatus::Scheduled)).unwrap();

        let date = datetime::parse_date("2024-05-28").unwrap();
        let result = available_times(&conn, date, "vet-1", &small_template()).unwrap();
        assert_eq!(result.values(), vec!["09:00", "10:00", "10:30", "11:00"]);
    }
}
