use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::locations::NewLocation;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListFilters {
    #[serde(default)]
    pub include_inactive: bool,
}

async fn create_location(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewLocation>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state.locations.create(new).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

async fn list_locations(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ListFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let locations = state.locations.list(filters.include_inactive).await?;
    Ok(Json(locations))
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state.locations.get(id).await?;
    Ok(Json(location))
}

/// Barcode-driven lookup by slot code.
async fn get_location_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state.locations.get_by_code(&code).await?;
    Ok(Json(location))
}

async fn deactivate_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state.locations.deactivate(id).await?;
    Ok(Json(location))
}

async fn delete_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.locations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn location_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_location).get(list_locations))
        .route("/:id", get(get_location).delete(delete_location))
        .route("/:id/deactivate", post(deactivate_location))
        .route("/by-code/:code", get(get_location_by_code))
}
