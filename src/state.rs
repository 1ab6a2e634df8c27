use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::SlotTemplate;
use crate::services::notify::Notifier;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub template: SlotTemplate,
    pub notifier: Box<dyn Notifier>,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig, notifier: Box<dyn Notifier>) -> Self {
        let template = SlotTemplate::from_schedule(&config.schedule);
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            template,
            notifier,
        }
    }
}
