use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/appointments/available-times",
            get(handlers::appointments::available_times),
        )
        .route(
            "/appointments/available-times",
            get(handlers::appointments::available_times),
        )
        .route(
            "/api/appointments",
            get(handlers::appointments::list_appointments)
                .post(handlers::appointments::create_appointment),
        )
        .route(
            "/api/appointments/:id",
            get(handlers::appointments::get_appointment),
        )
        .route(
            "/api/appointments/:id/cancel",
            post(handlers::appointments::cancel_appointment),
        )
        .route(
            "/api/appointments/:id/reschedule",
            post(handlers::appointments::reschedule_appointment),
        )
        .route(
            "/api/appointments/:id/status",
            post(handlers::appointments::update_status),
        )
        .route(
            "/api/appointments/:id/calendar.ics",
            get(handlers::calendar::download_ics),
        )
        .route("/api/providers", get(handlers::directory::list_providers))
        .route(
            "/api/pets",
            get(handlers::directory::list_pets).post(handlers::directory::create_pet),
        )
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/admin/users", post(handlers::admin::create_user))
        .route("/api/admin/sessions", post(handlers::admin::create_session))
        .with_state(state)
}
