mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use uuid::Uuid;

use cellar_wms::entities::stock_record::SalesArrangement;
use cellar_wms::errors::ServiceError;
use cellar_wms::services::ledger::{LedgerService, StockFilter, StockKey};
use cellar_wms::services::ownership::{OwnershipService, TransferRequest};

struct Fixture {
    ledger: LedgerService,
    ownership: OwnershipService,
    rack: cellar_wms::entities::location::Model,
    product: Uuid,
    seller: Uuid,
    buyer: Uuid,
    record_id: Uuid,
}

/// 12 consignment cases owned by the seller, 2 of them reserved. Seller and
/// buyer are both registered in the partner directory.
async fn fixture() -> Fixture {
    let db = common::setup_db().await;
    let sender = common::event_sender();
    let (catalog, product) = common::catalog_with_product("LWIN0012345").await;
    let seller = common::register_partner(&catalog, "Vinexport SARL").await;
    let buyer = common::register_partner(&catalog, "Harbourside Imports").await;
    let ledger = LedgerService::new(db.clone(), sender.clone(), catalog.clone());
    let ownership = OwnershipService::new(ledger.clone(), db.clone(), sender, catalog);
    let rack = common::create_location(&db, "B-02-03").await;
    common::receive_stock(
        &ledger,
        rack.id,
        product,
        seller,
        SalesArrangement::Consignment,
        12,
    )
    .await;
    let key = StockKey {
        location_id: rack.id,
        product_id: product,
        owner_id: seller,
        arrangement: SalesArrangement::Consignment,
    };
    let record = ledger.reserve(key, 2).await.unwrap();

    Fixture {
        ledger,
        ownership,
        rack,
        product,
        seller,
        buyer,
        record_id: record.id,
    }
}

fn request(f: &Fixture, quantity_cases: i32) -> TransferRequest {
    TransferRequest {
        stock_record_id: f.record_id,
        to_owner_id: f.buyer,
        quantity_cases,
        arrangement: SalesArrangement::Purchased,
        commission_percent: None,
        justification: Some("sold to importer".to_string()),
        recorded_by: "backoffice".to_string(),
    }
}

#[tokio::test]
async fn transfer_retitles_available_cases_in_place() {
    let f = fixture().await;
    let buyer = f.buyer;
    let movement = f.ownership.transfer(request(&f, 10)).await.unwrap();
    assert_eq!(movement.movement_type, "ownership_transfer");
    assert_eq!(movement.from_location_id, Some(f.rack.id));
    assert_eq!(movement.from_arrangement.as_deref(), Some("consignment"));
    assert_eq!(movement.arrangement.as_deref(), Some("purchased"));

    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: Some(f.rack.id),
            product_id: Some(f.product),
            owner_id: None,
            include_empty: false,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.total_cases, 12);
    let buyer_row = snapshot
        .records
        .iter()
        .find(|r| r.owner_id == buyer)
        .unwrap();
    assert_eq!(buyer_row.quantity_cases, 10);
    assert_eq!(buyer_row.arrangement, "purchased");
    let seller_row = snapshot
        .records
        .iter()
        .find(|r| r.owner_id == f.seller)
        .unwrap();
    assert_eq!(seller_row.quantity_cases, 2);
    assert_eq!(seller_row.reserved_cases, 2);
}

#[tokio::test]
async fn reserved_cases_cannot_change_hands() {
    let f = fixture().await;
    // 12 on hand, 2 reserved: 11 exceeds the 10 available.
    assert_matches!(
        f.ownership.transfer(request(&f, 11)).await,
        Err(ServiceError::InsufficientStock(_))
    );
    // Exactly the available amount goes through.
    f.ownership.transfer(request(&f, 10)).await.unwrap();
}

#[tokio::test]
async fn transfer_to_the_current_owner_is_rejected() {
    let f = fixture().await;
    assert_matches!(
        f.ownership
            .transfer(TransferRequest {
                to_owner_id: f.seller,
                ..request(&f, 1)
            })
            .await,
        Err(ServiceError::SameOwner(_))
    );
}

#[tokio::test]
async fn commission_rules_follow_the_arrangement() {
    let f = fixture().await;

    // Staying on consignment requires a commission.
    assert_matches!(
        f.ownership
            .transfer(TransferRequest {
                arrangement: SalesArrangement::Consignment,
                commission_percent: None,
                ..request(&f, 2)
            })
            .await,
        Err(ServiceError::ValidationError(_))
    );
    // Out-of-range commission is rejected.
    assert_matches!(
        f.ownership
            .transfer(TransferRequest {
                arrangement: SalesArrangement::Consignment,
                commission_percent: Some(Decimal::from(101)),
                ..request(&f, 2)
            })
            .await,
        Err(ServiceError::ValidationError(_))
    );
    // A purchased transfer must not carry one.
    assert_matches!(
        f.ownership
            .transfer(TransferRequest {
                commission_percent: Some(Decimal::from(10)),
                ..request(&f, 2)
            })
            .await,
        Err(ServiceError::ValidationError(_))
    );

    // Valid consignment transfer records the commission on the movement.
    let movement = f
        .ownership
        .transfer(TransferRequest {
            arrangement: SalesArrangement::Consignment,
            commission_percent: Some(Decimal::new(125, 1)), // 12.5%
            ..request(&f, 2)
        })
        .await
        .unwrap();
    assert_eq!(movement.commission_percent, Some(Decimal::new(125, 1)));
}

#[tokio::test]
async fn transfer_to_an_unlisted_partner_is_rejected() {
    let f = fixture().await;
    assert_matches!(
        f.ownership
            .transfer(TransferRequest {
                to_owner_id: Uuid::new_v4(),
                ..request(&f, 1)
            })
            .await,
        Err(ServiceError::NotFound(_))
    );

    // The stock stayed with the seller, untouched.
    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: Some(f.rack.id),
            product_id: Some(f.product),
            owner_id: Some(f.seller),
            include_empty: false,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.total_cases, 12);
}

#[tokio::test]
async fn unknown_stock_record_is_not_found() {
    let f = fixture().await;
    assert_matches!(
        f.ownership
            .transfer(TransferRequest {
                stock_record_id: Uuid::new_v4(),
                ..request(&f, 1)
            })
            .await,
        Err(ServiceError::NotFound(_))
    );
}
