use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCountRequest {
    pub location_id: Uuid,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordItemRequest {
    pub counted_cases: i32,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    /// Item id to approval verdict; items left out are treated as rejected.
    #[serde(default)]
    pub approvals: HashMap<Uuid, bool>,
    pub recorded_by: String,
}

async fn create_count(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .cycle_counts
        .create_count(request.location_id, request.created_by)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_count(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.cycle_counts.get_count(id).await?;
    Ok(Json(detail))
}

async fn start_count(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.cycle_counts.start_count(id).await?;
    Ok(Json(detail))
}

async fn record_item(
    State(state): State<Arc<AppState>>,
    Path((count_id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RecordItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .cycle_counts
        .record_item(count_id, item_id, request.counted_cases)
        .await?;
    Ok(Json(item))
}

async fn complete_count(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.cycle_counts.complete_count(id).await?;
    Ok(Json(detail))
}

async fn reconcile_count(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReconcileRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .cycle_counts
        .reconcile_count(id, request.approvals, request.recorded_by)
        .await?;
    Ok(Json(detail))
}

pub fn cycle_count_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_count))
        .route("/:id", get(get_count))
        .route("/:id/start", post(start_count))
        .route("/:id/items/:item_id", post(record_item))
        .route("/:id/complete", post(complete_count))
        .route("/:id/reconcile", post(reconcile_count))
}
