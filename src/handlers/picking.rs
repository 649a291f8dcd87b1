use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::picking::PickDemand;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReleasePickListRequest {
    pub reference: Option<String>,
    pub demands: Vec<PickDemand>,
}

#[derive(Debug, Deserialize)]
pub struct PickItemRequest {
    pub location_barcode: String,
    pub case_barcode: String,
    /// Defaults to the full demanded quantity; less records a short pick.
    pub quantity_cases: Option<i32>,
    pub recorded_by: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletePickListRequest {
    pub recorded_by: String,
}

async fn release_pick_list(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReleasePickListRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .picking
        .release_pick_list(request.reference, request.demands)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_pick_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.picking.get_pick_list(id).await?;
    Ok(Json(detail))
}

async fn pick_item(
    State(state): State<Arc<AppState>>,
    Path((list_id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<PickItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .picking
        .pick_item(
            list_id,
            item_id,
            request.location_barcode,
            request.case_barcode,
            request.quantity_cases,
            request.recorded_by,
        )
        .await?;
    Ok(Json(detail))
}

async fn complete_pick_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompletePickListRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .picking
        .complete_pick_list(id, request.recorded_by)
        .await?;
    Ok(Json(detail))
}

async fn delete_pick_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.picking.delete_pick_list(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn pick_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(release_pick_list))
        .route("/:id", get(get_pick_list).delete(delete_pick_list))
        .route("/:id/items/:item_id/pick", post(pick_item))
        .route("/:id/complete", post(complete_pick_list))
}
