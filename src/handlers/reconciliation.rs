use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::reconciliation::Scope;
use crate::AppState;

/// At most one scope dimension; none means the whole warehouse.
#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    pub location_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
}

impl ScopeQuery {
    fn scope(&self) -> Result<Scope, ServiceError> {
        let set = [
            self.location_id.is_some(),
            self.product_id.is_some(),
            self.owner_id.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        if set > 1 {
            return Err(ServiceError::ValidationError(
                "reconciliation accepts at most one of location_id, product_id, owner_id"
                    .to_string(),
            ));
        }
        Ok(if let Some(id) = self.location_id {
            Scope::Location(id)
        } else if let Some(id) = self.product_id {
            Scope::Product(id)
        } else if let Some(id) = self.owner_id {
            Scope::Owner(id)
        } else {
            Scope::Warehouse
        })
    }
}

async fn run_reconciliation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScopeQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.reconciliation.reconcile(query.scope()?).await?;
    Ok(Json(report))
}

pub fn reconciliation_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(run_reconciliation))
}
