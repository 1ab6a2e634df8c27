use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Appointment, AppointmentStatus, Pet, Role, User};
use crate::services::datetime;

const APPOINTMENT_COLUMNS: &str = "id, pet_id, provider_id, start_date_time, duration_minutes, status, reason, notes, created_at, updated_at";

// ── Appointments ──

/// Every appointment stored on `date`, regardless of provider or status.
pub fn find_appointments_by_date(
    conn: &Connection,
    date: NaiveDate,
) -> anyhow::Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_date = ?1 ORDER BY start_date_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![datetime::storage_date(date)], |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn create_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, pet_id, provider_id, appointment_date, start_date_time, duration_minutes, status, reason, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            appt.id,
            appt.pet_id,
            appt.provider_id,
            datetime::storage_date(appt.date()),
            datetime::to_storage(&appt.start_date_time),
            appt.duration_minutes,
            appt.status.as_str(),
            appt.reason,
            appt.notes,
            datetime::to_storage(&appt.created_at),
            datetime::to_storage(&appt.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_appointment_row(row)));

    match result {
        Ok(appt) => Ok(Some(appt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> anyhow::Result<bool> {
    let now = datetime::to_storage(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn reschedule_appointment(
    conn: &Connection,
    id: &str,
    start: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let now = datetime::to_storage(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE appointments SET appointment_date = ?1, start_date_time = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            datetime::storage_date(start.date()),
            datetime::to_storage(start),
            now,
            id
        ],
    )?;
    Ok(count > 0)
}

#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    pub date: Option<NaiveDate>,
    pub provider_id: Option<String>,
    pub pet_id: Option<String>,
    /// Restricts results to pets owned by this user.
    pub owner_id: Option<String>,
    pub limit: i64,
}

pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> anyhow::Result<Vec<Appointment>> {
    let mut clauses: Vec<String> = vec![];
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(date) = filter.date {
        values.push(Box::new(datetime::storage_date(date)));
        clauses.push(format!("a.appointment_date = ?{}", values.len()));
    }
    if let Some(provider_id) = &filter.provider_id {
        values.push(Box::new(provider_id.clone()));
        clauses.push(format!("a.provider_id = ?{}", values.len()));
    }
    if let Some(pet_id) = &filter.pet_id {
        values.push(Box::new(pet_id.clone()));
        clauses.push(format!("a.pet_id = ?{}", values.len()));
    }
    if let Some(owner_id) = &filter.owner_id {
        values.push(Box::new(owner_id.clone()));
        clauses.push(format!(
            "a.pet_id IN (SELECT id FROM pets WHERE owner_id = ?{})",
            values.len()
        ));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let limit = if filter.limit > 0 { filter.limit } else { 100 };
    values.push(Box::new(limit));

    let columns = APPOINTMENT_COLUMNS
        .split(", ")
        .map(|c| format!("a.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {columns} FROM appointments a {where_sql} ORDER BY a.start_date_time ASC LIMIT ?{}",
        values.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let id: String = row.get(0)?;
    let pet_id: String = row.get(1)?;
    let provider_id: String = row.get(2)?;
    let start_str: String = row.get(3)?;
    let duration_minutes: Option<i32> = row.get(4)?;
    let status_str: String = row.get(5)?;
    let reason: Option<String> = row.get(6)?;
    let notes: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    let status = AppointmentStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("unknown appointment status '{status_str}' on {id}"))?;

    Ok(Appointment {
        start_date_time: datetime::from_storage(&start_str)?,
        created_at: datetime::from_storage(&created_at_str)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
        updated_at: datetime::from_storage(&updated_at_str)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
        id,
        pet_id,
        provider_id,
        duration_minutes,
        status,
        reason,
        notes,
    })
}

// ── Users ──

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, name, email, role FROM users WHERE id = ?1",
        params![id],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, role)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           email = excluded.email,
           role = excluded.role",
        params![user.id, user.name, user.email, user.role.as_str()],
    )?;
    Ok(())
}

pub fn list_providers(conn: &Connection) -> anyhow::Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, role FROM users WHERE role = ?1 ORDER BY name ASC",
    )?;
    let rows = stmt.query_map(params![Role::Veterinarian.as_str()], parse_user_row)?;

    let mut users = vec![];
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: Role::parse(&role).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown role: {role}").into(),
            )
        })?,
    })
}

// ── Pets ──

pub fn create_pet(conn: &Connection, pet: &Pet) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO pets (id, owner_id, name, species, breed) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![pet.id, pet.owner_id, pet.name, pet.species, pet.breed],
    )?;
    Ok(())
}

pub fn get_pet(conn: &Connection, id: &str) -> anyhow::Result<Option<Pet>> {
    let result = conn.query_row(
        "SELECT id, owner_id, name, species, breed FROM pets WHERE id = ?1",
        params![id],
        parse_pet_row,
    );

    match result {
        Ok(pet) => Ok(Some(pet)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_pets(conn: &Connection, owner_id: Option<&str>) -> anyhow::Result<Vec<Pet>> {
    let mut pets = vec![];
    match owner_id {
        Some(owner) => {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, species, breed FROM pets WHERE owner_id = ?1 ORDER BY name ASC",
            )?;
            for row in stmt.query_map(params![owner], parse_pet_row)? {
                pets.push(row?);
            }
        }
        None => {
            let mut stmt = conn
                .prepare("SELECT id, owner_id, name, species, breed FROM pets ORDER BY name ASC")?;
            for row in stmt.query_map([], parse_pet_row)? {
                pets.push(row?);
            }
        }
    }
    Ok(pets)
}

fn parse_pet_row(row: &rusqlite::Row) -> rusqlite::Result<Pet> {
    Ok(Pet {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
    })
}

// ── Sessions ──

pub fn create_session(
    conn: &Connection,
    token: &str,
    user_id: &str,
    ttl_hours: i64,
) -> anyhow::Result<NaiveDateTime> {
    let expires_at = Utc::now().naive_utc() + Duration::hours(ttl_hours);
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, datetime::to_storage(&expires_at)],
    )?;
    Ok(expires_at)
}

/// The user behind an unexpired session token.
pub fn get_session_user(conn: &Connection, token: &str) -> anyhow::Result<Option<User>> {
    let now = datetime::to_storage(&Utc::now().naive_utc());
    let result = conn.query_row(
        "SELECT u.id, u.name, u.email, u.role FROM sessions s
         INNER JOIN users u ON u.id = s.user_id
         WHERE s.token = ?1 AND s.expires_at > ?2",
        params![token, now],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_session(conn: &Connection, token: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(count > 0)
}

pub fn expire_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = datetime::to_storage(&Utc::now().naive_utc());
    let count = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
    Ok(count)
}
