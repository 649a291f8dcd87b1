mod common;

use assert_matches::assert_matches;
use std::collections::HashMap;
use uuid::Uuid;

use cellar_wms::entities::cycle_count::CountStatus;
use cellar_wms::entities::stock_record::SalesArrangement;
use cellar_wms::errors::ServiceError;
use cellar_wms::services::cycle_counts::CycleCountService;
use cellar_wms::services::ledger::{LedgerService, MovementFilter, StockFilter};

struct Fixture {
    db: std::sync::Arc<sea_orm::DatabaseConnection>,
    ledger: LedgerService,
    counts: CycleCountService,
    rack: cellar_wms::entities::location::Model,
    product: Uuid,
    owner: Uuid,
}

/// 5 purchased cases of one product in A-03-01.
async fn fixture() -> Fixture {
    let db = common::setup_db().await;
    let sender = common::event_sender();
    let (catalog, product) = common::catalog_with_product("LWIN0012345").await;
    let ledger = LedgerService::new(db.clone(), sender.clone(), catalog);
    let counts = CycleCountService::new(db.clone(), sender);
    let rack = common::create_location(&db, "A-03-01").await;
    let owner = Uuid::new_v4();
    common::receive_stock(
        &ledger,
        rack.id,
        product,
        owner,
        SalesArrangement::Purchased,
        5,
    )
    .await;
    Fixture {
        db,
        ledger,
        counts,
        rack,
        product,
        owner,
    }
}

#[tokio::test]
async fn count_snapshots_the_location_and_walks_the_state_machine() {
    let f = fixture().await;
    let detail = f
        .counts
        .create_count(f.rack.id, "supervisor".to_string())
        .await
        .unwrap();
    assert_eq!(detail.count.status, CountStatus::Pending.as_str());
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].expected_cases, 5);

    // Items cannot be recorded before the count starts.
    assert_matches!(
        f.counts.record_item(detail.count.id, detail.items[0].id, 5).await,
        Err(ServiceError::InvalidStateTransition(_))
    );

    let started = f.counts.start_count(detail.count.id).await.unwrap();
    assert_eq!(started.count.status, CountStatus::InProgress.as_str());
    assert!(started.count.started_at.is_some());

    // Completing with uncounted items is rejected.
    assert_matches!(
        f.counts.complete_count(detail.count.id).await,
        Err(ServiceError::ValidationError(_))
    );

    // A re-count overwrites the earlier figure.
    f.counts
        .record_item(detail.count.id, detail.items[0].id, 4)
        .await
        .unwrap();
    let item = f
        .counts
        .record_item(detail.count.id, detail.items[0].id, 3)
        .await
        .unwrap();
    assert_eq!(item.counted_cases, Some(3));
    assert_eq!(item.discrepancy, Some(-2));

    let completed = f.counts.complete_count(detail.count.id).await.unwrap();
    assert_eq!(completed.count.status, CountStatus::Completed.as_str());
    assert_eq!(completed.count.discrepancy_items, Some(1));

    // No reopen: the state machine is one-directional.
    assert_matches!(
        f.counts.start_count(detail.count.id).await,
        Err(ServiceError::InvalidStateTransition(_))
    );
}

#[tokio::test]
async fn approved_discrepancy_adjusts_the_ledger() {
    let f = fixture().await;
    let detail = f
        .counts
        .create_count(f.rack.id, "supervisor".to_string())
        .await
        .unwrap();
    let item_id = detail.items[0].id;
    f.counts.start_count(detail.count.id).await.unwrap();
    f.counts.record_item(detail.count.id, item_id, 3).await.unwrap();
    f.counts.complete_count(detail.count.id).await.unwrap();

    let mut approvals = HashMap::new();
    approvals.insert(item_id, true);
    let reconciled = f
        .counts
        .reconcile_count(detail.count.id, approvals, "supervisor".to_string())
        .await
        .unwrap();
    assert_eq!(reconciled.count.status, CountStatus::Reconciled.as_str());
    assert_eq!(reconciled.items[0].approved, Some(true));

    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: Some(f.rack.id),
            product_id: Some(f.product),
            owner_id: Some(f.owner),
            include_empty: false,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.total_cases, 3);

    // The correction went through the log as an adjust movement.
    let adjusts = f
        .ledger
        .get_movement_history(MovementFilter {
            movement_type: Some("adjust".to_string()),
            reference_id: Some(detail.count.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(adjusts.len(), 1);
    assert_eq!(adjusts[0].quantity_cases, -2);
    assert_eq!(adjusts[0].reference_type.as_deref(), Some("cycle_count"));
}

#[tokio::test]
async fn reconciling_twice_applies_the_adjustments_once() {
    let f = fixture().await;
    let detail = f
        .counts
        .create_count(f.rack.id, "supervisor".to_string())
        .await
        .unwrap();
    let item_id = detail.items[0].id;
    f.counts.start_count(detail.count.id).await.unwrap();
    f.counts.record_item(detail.count.id, item_id, 3).await.unwrap();
    f.counts.complete_count(detail.count.id).await.unwrap();

    let mut approvals = HashMap::new();
    approvals.insert(item_id, true);
    f.counts
        .reconcile_count(detail.count.id, approvals.clone(), "supervisor".to_string())
        .await
        .unwrap();

    // Reconciled is terminal: a repeat is rejected and writes nothing.
    assert_matches!(
        f.counts
            .reconcile_count(detail.count.id, approvals, "supervisor".to_string())
            .await,
        Err(ServiceError::InvalidStateTransition(_))
    );

    let adjusts = f
        .ledger
        .get_movement_history(MovementFilter {
            movement_type: Some("adjust".to_string()),
            reference_id: Some(detail.count.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(adjusts.len(), 1);

    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: Some(f.rack.id),
            product_id: Some(f.product),
            owner_id: Some(f.owner),
            include_empty: false,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.total_cases, 3);
}

#[tokio::test]
async fn rejected_discrepancy_leaves_stock_untouched() {
    let f = fixture().await;
    let detail = f
        .counts
        .create_count(f.rack.id, "supervisor".to_string())
        .await
        .unwrap();
    let item_id = detail.items[0].id;
    f.counts.start_count(detail.count.id).await.unwrap();
    f.counts.record_item(detail.count.id, item_id, 9).await.unwrap();
    f.counts.complete_count(detail.count.id).await.unwrap();

    // No approvals at all: everything defaults to rejected.
    let reconciled = f
        .counts
        .reconcile_count(detail.count.id, HashMap::new(), "supervisor".to_string())
        .await
        .unwrap();
    assert_eq!(reconciled.items[0].approved, Some(false));

    let snapshot = f
        .ledger
        .get_stock_snapshot(StockFilter {
            location_id: Some(f.rack.id),
            product_id: Some(f.product),
            owner_id: Some(f.owner),
            include_empty: false,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.total_cases, 5);
}

#[tokio::test]
async fn counting_an_empty_location_is_allowed() {
    let f = fixture().await;
    let empty = common::create_location(&f.db, "Z-99-99").await;
    let detail = f
        .counts
        .create_count(empty.id, "supervisor".to_string())
        .await
        .unwrap();
    assert!(detail.items.is_empty());

    f.counts.start_count(detail.count.id).await.unwrap();
    let completed = f.counts.complete_count(detail.count.id).await.unwrap();
    assert_eq!(completed.count.discrepancy_items, Some(0));
}

#[tokio::test]
async fn count_for_unknown_location_is_rejected() {
    let f = fixture().await;
    assert_matches!(
        f.counts
            .create_count(Uuid::new_v4(), "supervisor".to_string())
            .await,
        Err(ServiceError::NotFound(_))
    );
}
