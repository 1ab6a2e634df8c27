use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use vetclinic::config::AppConfig;
use vetclinic::db::{self, queries};
use vetclinic::routes;
use vetclinic::services::notify::webhook::WebhookNotifier;
use vetclinic::services::notify::{LogNotifier, Notifier};
use vetclinic::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let notifier: Box<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "using webhook notifier");
            Box::new(WebhookNotifier::new(
                url.clone(),
                config.notify_webhook_secret.clone(),
            ))
        }
        None => {
            tracing::info!("NOTIFY_WEBHOOK_URL not set, notifications are logged only");
            Box::new(LogNotifier)
        }
    };

    tracing::info!(
        open = %config.schedule.open,
        close = %config.schedule.close,
        slot_minutes = config.schedule.slot_minutes,
        "clinic hours"
    );

    let state = Arc::new(AppState::new(conn, config.clone(), notifier));

    let sweeper_db = Arc::clone(&state.db);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let result = db::lock(&sweeper_db).and_then(|conn| queries::expire_sessions(&conn));
            match result {
                Ok(0) => {}
                Ok(n) => tracing::info!(expired = n, "removed expired sessions"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    });

    let app = routes::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
