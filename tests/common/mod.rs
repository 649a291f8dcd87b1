#![allow(dead_code)]

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use uuid::Uuid;

use cellar_wms::catalog::{InMemoryCatalog, PartnerRef, ProductRef};
use cellar_wms::entities::location::{self, LocationKind};
use cellar_wms::entities::stock_movement::MovementType;
use cellar_wms::entities::stock_record::SalesArrangement;
use cellar_wms::events::{self, EventSender};
use cellar_wms::migrator::Migrator;
use cellar_wms::services::ledger::{LedgerService, MovementInput};
use cellar_wms::services::locations::{LocationService, NewLocation};

pub async fn setup_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should connect");
    Migrator::up(&db, None).await.expect("migrations apply");
    Arc::new(db)
}

/// Event sender whose receiver is drained by a background task, so services
/// never see a closed channel.
pub fn event_sender() -> EventSender {
    let (tx, rx) = events::channel();
    tokio::spawn(events::process_events(rx));
    tx
}

pub async fn create_location(db: &Arc<DatabaseConnection>, code: &str) -> location::Model {
    LocationService::new(db.clone())
        .create(NewLocation {
            code: code.to_string(),
            aisle: None,
            bay: None,
            level: None,
            kind: LocationKind::Rack,
            case_capacity: None,
            requires_forklift: false,
        })
        .await
        .expect("location creation succeeds")
}

/// Books cases into a location through the normal receive path.
pub async fn receive_stock(
    ledger: &LedgerService,
    location_id: Uuid,
    product_id: Uuid,
    owner_id: Uuid,
    arrangement: SalesArrangement,
    quantity_cases: i32,
) {
    ledger
        .append_movement(MovementInput {
            movement_type: MovementType::Receive,
            product_id: Some(product_id),
            from_location_id: None,
            to_location_id: Some(location_id),
            from_owner_id: None,
            to_owner_id: Some(owner_id),
            arrangement,
            from_arrangement: None,
            quantity_cases,
            commission_percent: None,
            reference_id: None,
            reference_type: None,
            reason: None,
            recorded_by: "test".to_string(),
        })
        .await
        .expect("receive movement succeeds");
}

/// Catalog preloaded with one product; returns the catalog and product id.
pub async fn catalog_with_product(code: &str) -> (Arc<InMemoryCatalog>, Uuid) {
    let catalog = Arc::new(InMemoryCatalog::new());
    let product_id = register_product(&catalog, code).await;
    (catalog, product_id)
}

pub async fn register_product(catalog: &Arc<InMemoryCatalog>, code: &str) -> Uuid {
    let id = Uuid::new_v4();
    catalog
        .insert_product(ProductRef {
            id,
            name: format!("Ch. Test {}", code),
            code: code.to_string(),
        })
        .await;
    id
}

pub async fn register_partner(catalog: &Arc<InMemoryCatalog>, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    catalog
        .insert_partner(PartnerRef {
            id,
            name: name.to_string(),
        })
        .await;
    id
}
