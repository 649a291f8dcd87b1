//! Case-level stock ledger and reconciliation core for a wine-import
//! warehouse: append-only movement log, derived stock table, scan-verified
//! picking, cycle counts and ownership transfers.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::{PartnerDirectory, ProductCatalog};
use crate::events::EventSender;
use crate::services::{
    CycleCountService, LedgerService, LocationService, OwnershipService, PickService,
    ReconciliationService,
};

/// Shared state for every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: EventSender,
    pub ledger: LedgerService,
    pub locations: LocationService,
    pub picking: PickService,
    pub cycle_counts: CycleCountService,
    pub ownership: OwnershipService,
    pub reconciliation: ReconciliationService,
    pub catalog: Arc<dyn ProductCatalog>,
    pub partners: Arc<dyn PartnerDirectory>,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: EventSender,
        catalog: Arc<dyn ProductCatalog>,
        partners: Arc<dyn PartnerDirectory>,
    ) -> Self {
        let ledger = LedgerService::new(db.clone(), event_sender.clone(), catalog.clone());
        let locations = LocationService::new(db.clone());
        let picking = PickService::new(db.clone(), event_sender.clone(), catalog.clone());
        let cycle_counts = CycleCountService::new(db.clone(), event_sender.clone());
        let ownership = OwnershipService::new(
            ledger.clone(),
            db.clone(),
            event_sender.clone(),
            partners.clone(),
        );
        let reconciliation = ReconciliationService::new(db.clone());

        Self {
            db,
            config,
            event_sender,
            ledger,
            locations,
            picking,
            cycle_counts,
            ownership,
            reconciliation,
            catalog,
            partners,
        }
    }
}

/// All versioned API routes.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/movements", handlers::stock::movement_routes())
        .nest("/stock", handlers::stock::stock_routes())
        .nest("/locations", handlers::locations::location_routes())
        .nest("/pick-lists", handlers::picking::pick_routes())
        .nest("/cycle-counts", handlers::cycle_counts::cycle_count_routes())
        .nest("/ownership", handlers::ownership::ownership_routes())
        .nest("/reconciliation", handlers::reconciliation::reconciliation_routes())
}

/// Builds the application router with middleware applied.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "cellar-wms up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
