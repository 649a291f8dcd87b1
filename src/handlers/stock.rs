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

use crate::entities::stock_record::SalesArrangement;
use crate::errors::ServiceError;
use crate::services::ledger::{MovementFilter, MovementInput, StockFilter, StockKey};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReservationRequest {
    pub location_id: Uuid,
    pub product_id: Uuid,
    pub owner_id: Uuid,
    pub arrangement: SalesArrangement,
    pub quantity_cases: i32,
}

impl ReservationRequest {
    fn key(&self) -> StockKey {
        StockKey {
            location_id: self.location_id,
            product_id: self.product_id,
            owner_id: self.owner_id,
            arrangement: self.arrangement,
        }
    }
}

/// Append a movement to the log.
async fn append_movement(
    State(state): State<Arc<AppState>>,
    Json(input): Json<MovementInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement = state.ledger.append_movement(input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// Movement history, newest first, filterable by type, product, location,
/// owner or back-reference.
async fn get_movement_history(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<MovementFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements = state.ledger.get_movement_history(filter).await?;
    Ok(Json(movements))
}

async fn get_movement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement = state.ledger.get_movement(id).await?;
    Ok(Json(movement))
}

/// Current stock snapshot with per-filter totals.
async fn get_stock_snapshot(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<StockFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.ledger.get_stock_snapshot(filter).await?;
    Ok(Json(snapshot))
}

async fn reserve_stock(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReservationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .ledger
        .reserve(request.key(), request.quantity_cases)
        .await?;
    Ok(Json(record))
}

async fn release_stock(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReservationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .ledger
        .release(request.key(), request.quantity_cases)
        .await?;
    Ok(Json(record))
}

pub fn movement_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(append_movement).get(get_movement_history))
        .route("/:id", get(get_movement))
}

pub fn stock_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_stock_snapshot))
        .route("/reserve", post(reserve_stock))
        .route("/release", post(release_stock))
}
