use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::handlers::auth::current_user;
use crate::models::{Pet, Role};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProviderResponse {
    id: String,
    name: String,
}

// GET /api/providers
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    current_user(&state, &headers)?;

    let providers = {
        let conn = db::lock(&state.db)?;
        queries::list_providers(&conn)?
    };
    let providers: Vec<ProviderResponse> = providers
        .into_iter()
        .map(|u| ProviderResponse { id: u.id, name: u.name })
        .collect();

    Ok(Json(serde_json::json!({ "success": true, "providers": providers })))
}

// GET /api/pets
pub async fn list_pets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = current_user(&state, &headers)?;
    let owner = (!user.role.is_staff()).then_some(user.id.as_str());

    let pets = {
        let conn = db::lock(&state.db)?;
        queries::list_pets(&conn, owner)?
    };
    Ok(Json(serde_json::json!({ "success": true, "pets": pets })))
}

// POST /api/pets
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetRequest {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    /// Staff may register a pet on behalf of a customer.
    pub owner_id: Option<String>,
}

pub async fn create_pet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreatePetRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let user = current_user(&state, &headers)?;

    let name = body.name.trim();
    let species = body.species.trim();
    if name.is_empty() || species.is_empty() {
        return Err(AppError::BadRequest("name and species are required".to_string()));
    }

    let owner_id = match (user.role, body.owner_id) {
        (Role::Customer, _) | (_, None) => user.id.clone(),
        (_, Some(owner)) => owner,
    };

    let pet = Pet {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id,
        name: name.to_string(),
        species: species.to_lowercase(),
        breed: body.breed.filter(|b| !b.trim().is_empty()),
    };

    {
        let conn = db::lock(&state.db)?;
        if queries::get_user(&conn, &pet.owner_id)?.is_none() {
            return Err(AppError::NotFound(format!("owner {}", pet.owner_id)));
        }
        queries::create_pet(&conn, &pet)?;
    }
    tracing::info!(pet_id = %pet.id, owner_id = %pet.owner_id, "pet registered");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "pet": pet })),
    ))
}
