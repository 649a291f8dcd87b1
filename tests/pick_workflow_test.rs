mod common;

use assert_matches::assert_matches;
use uuid::Uuid;

use cellar_wms::entities::pick_list::PickListStatus;
use cellar_wms::entities::pick_list_item::PickItemStatus;
use cellar_wms::entities::stock_record::SalesArrangement;
use cellar_wms::errors::ServiceError;
use cellar_wms::services::ledger::{LedgerService, MovementFilter, StockFilter};
use cellar_wms::services::picking::{PickDemand, PickService};

struct Fixture {
    db: std::sync::Arc<sea_orm::DatabaseConnection>,
    ledger: LedgerService,
    picking: PickService,
    product: Uuid,
    owner: Uuid,
}

/// 30 purchased cases in A-01-02, product code LWIN1234567.
async fn fixture() -> Fixture {
    let db = common::setup_db().await;
    let sender = common::event_sender();
    let (catalog, product) = common::catalog_with_product("LWIN1234567").await;
    let ledger = LedgerService::new(db.clone(), sender.clone(), catalog.clone());
    let picking = PickService::new(db.clone(), sender, catalog);

    let rack = common::create_location(&db, "A-01-02").await;
    let owner = Uuid::new_v4();
    common::receive_stock(
        &ledger,
        rack.id,
        product,
        owner,
        SalesArrangement::Purchased,
        30,
    )
    .await;

    Fixture {
        db,
        ledger,
        picking,
        product,
        owner,
    }
}

fn demand(f: &Fixture, quantity_cases: i32) -> PickDemand {
    PickDemand {
        product_id: f.product,
        owner_id: f.owner,
        arrangement: SalesArrangement::Purchased,
        quantity_cases,
    }
}

#[tokio::test]
async fn release_reserves_stock_and_orders_items_by_slot_code() {
    let f = fixture().await;
    // Second product in a slot that sorts before A-01-02.
    let early = common::create_location(&f.db, "A-01-01").await;
    let (other_product, other_owner) = (f.product, f.owner);
    common::receive_stock(
        &f.ledger,
        early.id,
        other_product,
        other_owner,
        SalesArrangement::Consignment,
        10,
    )
    .await;

    let detail = f
        .picking
        .release_pick_list(
            Some("ORD-1001".to_string()),
            vec![
                demand(&f, 6),
                PickDemand {
                    product_id: other_product,
                    owner_id: other_owner,
                    arrangement: SalesArrangement::Consignment,
                    quantity_cases: 4,
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(detail.list.status, PickListStatus::Released.as_str());
    assert_eq!(detail.list.total_items, 2);
    // Walking order: A-01-01 before A-01-02.
    assert_eq!(detail.items[0].suggested_location_id, early.id);
    assert_eq!(detail.items[0].position, 0);

    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: None,
            product_id: Some(f.product),
            owner_id: None,
            include_empty: false,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.reserved_cases, 10);
    assert_eq!(snapshot.total_cases, 40);
}

#[tokio::test]
async fn release_fails_when_no_single_slot_covers_a_line() {
    let f = fixture().await;
    let result = f
        .picking
        .release_pick_list(None, vec![demand(&f, 31)])
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    // Nothing was reserved by the failed release.
    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: None,
            product_id: Some(f.product),
            owner_id: None,
            include_empty: false,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.reserved_cases, 0);
}

#[tokio::test]
async fn full_pick_flow_debits_stock_and_completes() {
    let f = fixture().await;
    let detail = f
        .picking
        .release_pick_list(None, vec![demand(&f, 6)])
        .await
        .unwrap();
    let list_id = detail.list.id;
    let item = &detail.items[0];

    let after_pick = f
        .picking
        .pick_item(
            list_id,
            item.id,
            "A-01-02".to_string(),
            "LWIN1234567".to_string(),
            None,
            "alice".to_string(),
        )
        .await
        .unwrap();
    assert_eq!(after_pick.list.picked_items, 1);
    assert_eq!(after_pick.list.picked_cases, 6);
    assert_eq!(after_pick.items[0].status, PickItemStatus::Picked.as_str());
    assert_eq!(after_pick.items[0].picked_cases, Some(6));

    let done = f
        .picking
        .complete_pick_list(list_id, "alice".to_string())
        .await
        .unwrap();
    assert_eq!(done.list.status, PickListStatus::Completed.as_str());
    assert!(done.list.completed_at.is_some());

    // 30 - 6 on hand, no reservation left.
    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: None,
            product_id: Some(f.product),
            owner_id: None,
            include_empty: false,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.total_cases, 24);
    assert_eq!(snapshot.reserved_cases, 0);

    // The completion left a zero-delta marker referencing the list.
    let marker = f
        .ledger
        .get_movement_history(MovementFilter {
            movement_type: Some("count".to_string()),
            reference_id: Some(list_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(marker.len(), 1);
    assert_eq!(marker[0].quantity_cases, 0);
    assert_eq!(marker[0].product_id, None);

    // A completed list takes no further picks.
    let result = f
        .picking
        .pick_item(
            list_id,
            item.id,
            "A-01-02".to_string(),
            "LWIN1234567".to_string(),
            None,
            "alice".to_string(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::InvalidStateTransition(_)));
}

#[tokio::test]
async fn repeating_a_barcode_in_one_session_is_rejected() {
    let f = fixture().await;
    let detail = f
        .picking
        .release_pick_list(None, vec![demand(&f, 3), demand(&f, 4)])
        .await
        .unwrap();
    let list_id = detail.list.id;

    f.picking
        .pick_item(
            list_id,
            detail.items[0].id,
            "A-01-02".to_string(),
            "LWIN1234567".to_string(),
            None,
            "alice".to_string(),
        )
        .await
        .unwrap();

    // Both scans of the first item are burnt for this session.
    let result = f
        .picking
        .pick_item(
            list_id,
            detail.items[1].id,
            "A-01-02".to_string(),
            "case-9988776655".to_string(),
            None,
            "alice".to_string(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::DuplicateScan(ref b)) if b == "A-01-02");
}

#[tokio::test]
async fn scanning_the_same_barcode_twice_in_one_attempt_is_rejected() {
    let f = fixture().await;
    let detail = f
        .picking
        .release_pick_list(None, vec![demand(&f, 2)])
        .await
        .unwrap();

    // Case scan identical to the location scan: caught even though the
    // location scan of this very attempt is what recorded it.
    let result = f
        .picking
        .pick_item(
            detail.list.id,
            detail.items[0].id,
            "A-01-02".to_string(),
            "A-01-02".to_string(),
            None,
            "alice".to_string(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::DuplicateScan(_)));

    // The rejected attempt rolled back, so its scans are forgotten and a
    // corrected attempt goes through.
    f.picking
        .pick_item(
            detail.list.id,
            detail.items[0].id,
            "A-01-02".to_string(),
            "LWIN1234567".to_string(),
            None,
            "alice".to_string(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn wrong_location_and_bad_case_scans_leave_the_item_pending() {
    let f = fixture().await;
    common::create_location(&f.db, "C-09-01").await;
    let detail = f
        .picking
        .release_pick_list(None, vec![demand(&f, 2)])
        .await
        .unwrap();
    let item = &detail.items[0];

    let result = f
        .picking
        .pick_item(
            detail.list.id,
            item.id,
            "C-09-01".to_string(),
            "LWIN1234567".to_string(),
            None,
            "alice".to_string(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // A short garbage case scan is rejected by the soft policy.
    let result = f
        .picking
        .pick_item(
            detail.list.id,
            item.id,
            "A-01-02".to_string(),
            "XX1".to_string(),
            None,
            "alice".to_string(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let current = f.picking.get_pick_list(detail.list.id).await.unwrap();
    assert_eq!(current.items[0].status, PickItemStatus::Pending.as_str());
    assert_eq!(current.list.picked_items, 0);
}

#[tokio::test]
async fn short_pick_releases_the_remainder() {
    let f = fixture().await;
    let detail = f
        .picking
        .release_pick_list(None, vec![demand(&f, 10)])
        .await
        .unwrap();

    f.picking
        .pick_item(
            detail.list.id,
            detail.items[0].id,
            "A-01-02".to_string(),
            "LWIN1234567".to_string(),
            Some(7),
            "alice".to_string(),
        )
        .await
        .unwrap();

    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: None,
            product_id: Some(f.product),
            owner_id: None,
            include_empty: false,
        })
        .await
        .unwrap();
    // 30 - 7 picked; the unpicked 3 went back to available.
    assert_eq!(snapshot.total_cases, 23);
    assert_eq!(snapshot.reserved_cases, 0);

    // Over-picking past the demand is rejected up front.
    let detail2 = f
        .picking
        .release_pick_list(None, vec![demand(&f, 2)])
        .await
        .unwrap();
    let result = f
        .picking
        .pick_item(
            detail2.list.id,
            detail2.items[0].id,
            "A-01-02".to_string(),
            "7766554433".to_string(),
            Some(3),
            "alice".to_string(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn completion_requires_every_item_picked() {
    let f = fixture().await;
    let detail = f
        .picking
        .release_pick_list(None, vec![demand(&f, 2), demand(&f, 3)])
        .await
        .unwrap();

    let result = f
        .picking
        .complete_pick_list(detail.list.id, "alice".to_string())
        .await;
    assert_matches!(result, Err(ServiceError::InvalidStateTransition(_)));
}

#[tokio::test]
async fn untouched_list_deletes_and_releases_reservations() {
    let f = fixture().await;
    let detail = f
        .picking
        .release_pick_list(None, vec![demand(&f, 5)])
        .await
        .unwrap();

    f.picking.delete_pick_list(detail.list.id).await.unwrap();
    assert_matches!(
        f.picking.get_pick_list(detail.list.id).await,
        Err(ServiceError::NotFound(_))
    );

    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: None,
            product_id: Some(f.product),
            owner_id: None,
            include_empty: false,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.reserved_cases, 0);
}

#[tokio::test]
async fn list_with_picked_items_cannot_be_deleted() {
    let f = fixture().await;
    let detail = f
        .picking
        .release_pick_list(None, vec![demand(&f, 2), demand(&f, 3)])
        .await
        .unwrap();

    f.picking
        .pick_item(
            detail.list.id,
            detail.items[0].id,
            "A-01-02".to_string(),
            "LWIN1234567".to_string(),
            None,
            "alice".to_string(),
        )
        .await
        .unwrap();

    assert_matches!(
        f.picking.delete_pick_list(detail.list.id).await,
        Err(ServiceError::InvalidStateTransition(_))
    );
}
