use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::handlers::auth::current_user;
use crate::services::{booking, calendar::generate_ics};
use crate::state::AppState;

// GET /api/appointments/:id/calendar.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = current_user(&state, &headers)?;

    let (appt, pet) = {
        let conn = db::lock(&state.db)?;
        let appt = booking::find_for_actor(&conn, &user, &id)?;
        let pet = queries::get_pet(&conn, &appt.pet_id)?;
        (appt, pet)
    };

    let ics = generate_ics(&appt, pet.as_ref(), &state.config.clinic_name);
    let filename = format!("appointment-{}.ics", appt.id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
