use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use std::sync::Arc;

use crate::errors::ServiceError;
use crate::services::ownership::TransferRequest;
use crate::AppState;

async fn transfer_ownership(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TransferRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement = state.ownership.transfer(request).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

pub fn ownership_routes() -> Router<Arc<AppState>> {
    Router::new().route("/transfer", post(transfer_ownership))
}
