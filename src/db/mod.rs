pub mod migrations;
pub mod queries;

use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use rusqlite::Connection;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Locks the shared connection. A poisoned lock is surfaced as an error rather than a panic.
pub fn lock(db: &Mutex<Connection>) -> anyhow::Result<MutexGuard<'_, Connection>> {
    db.lock()
        .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
}
