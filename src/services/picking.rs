//! Scan-verified pick workflow.
//!
//! A released list reserves its demand; each item is then committed in a
//! single transaction that verifies the location scan, the case scan and the
//! quantity before the `pick` movement lands. A crash or rejection anywhere
//! in between leaves the item `pending`, not partially picked.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::catalog::ProductCatalog;
use crate::entities::{
    location::{self, Entity as Location},
    pick_list::{self, Entity as PickList, PickListStatus},
    pick_list_item::{self, Entity as PickListItem, PickItemStatus},
    pick_scan::{self, Entity as PickScan},
    stock_movement::MovementType,
    stock_record::{self, Entity as StockRecord, SalesArrangement},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::ledger::{adjust_reservation_on, apply_movement_on, MovementInput, StockKey};

/// Case-label verification is deliberately soft: physical labels are
/// inconsistent, so any scan at least this long passes even without a
/// substring match against the product code.
pub const MIN_FALLBACK_SCAN_LEN: usize = 6;

fn normalize_barcode(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Soft verification of a case scan against the product's LWIN-style code:
/// case-insensitive, hyphen-stripped substring match in either direction,
/// with a minimum-length fallback.
pub fn case_barcode_matches(scan: &str, product_code: &str) -> bool {
    let scan_n = normalize_barcode(scan);
    let code_n = normalize_barcode(product_code);
    if scan_n.is_empty() {
        return false;
    }
    if !code_n.is_empty() && (scan_n.contains(&code_n) || code_n.contains(&scan_n)) {
        return true;
    }
    scan_n.len() >= MIN_FALLBACK_SCAN_LEN
}

/// One demand line for a pick list release.
#[derive(Debug, Clone, Deserialize)]
pub struct PickDemand {
    pub product_id: Uuid,
    pub owner_id: Uuid,
    pub arrangement: SalesArrangement,
    pub quantity_cases: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickListDetail {
    pub list: pick_list::Model,
    pub items: Vec<pick_list_item::Model>,
}

#[derive(Clone)]
pub struct PickService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    catalog: Arc<dyn ProductCatalog>,
}

impl PickService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        event_sender: EventSender,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            catalog,
        }
    }

    /// Releases a pick list: suggests a source location per line and reserves
    /// the demanded cases there, all-or-nothing.
    #[instrument(skip(self, demands))]
    pub async fn release_pick_list(
        &self,
        reference: Option<String>,
        demands: Vec<PickDemand>,
    ) -> Result<PickListDetail, ServiceError> {
        if demands.is_empty() {
            return Err(ServiceError::ValidationError(
                "a pick list needs at least one demand line".to_string(),
            ));
        }
        for demand in &demands {
            if demand.quantity_cases < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "demand for product {} must be >= 1 case",
                    demand.product_id
                )));
            }
            self.catalog
                .product(demand.product_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Product {} not found in catalog",
                        demand.product_id
                    ))
                })?;
        }

        let db = &*self.db_pool;
        let detail = db
            .transaction::<_, PickListDetail, ServiceError>(move |txn| {
                Box::pin(async move {
                    // Choose a suggested location per line and reserve there.
                    let mut placed: Vec<(PickDemand, Uuid, String)> = Vec::new();
                    for demand in demands {
                        let candidates = StockRecord::find()
                            .filter(stock_record::Column::ProductId.eq(demand.product_id))
                            .filter(stock_record::Column::OwnerId.eq(demand.owner_id))
                            .filter(
                                stock_record::Column::Arrangement
                                    .eq(demand.arrangement.as_str()),
                            )
                            .all(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        let mut coded: Vec<(String, &stock_record::Model)> = Vec::new();
                        for record in &candidates {
                            let loc = Location::find_by_id(record.location_id)
                                .one(txn)
                                .await
                                .map_err(ServiceError::db_error)?
                                .ok_or_else(|| {
                                    ServiceError::InternalError(format!(
                                        "stock record {} references missing location {}",
                                        record.id, record.location_id
                                    ))
                                })?;
                            coded.push((loc.code, record));
                        }
                        // Lexicographic code order approximates the walking
                        // path; first slot that covers the full line wins.
                        coded.sort_by(|a, b| a.0.cmp(&b.0));
                        let chosen = coded
                            .iter()
                            .find(|(_, r)| r.available_cases() >= demand.quantity_cases)
                            .ok_or_else(|| {
                                let total: i32 =
                                    coded.iter().map(|(_, r)| r.available_cases()).sum();
                                ServiceError::InsufficientStock(format!(
                                    "no single location holds {} available cases of product {} \
                                     for owner {} ({} available in total)",
                                    demand.quantity_cases,
                                    demand.product_id,
                                    demand.owner_id,
                                    total
                                ))
                            })?;
                        let (code, location_id) = (chosen.0.clone(), chosen.1.location_id);

                        let key = StockKey {
                            location_id,
                            product_id: demand.product_id,
                            owner_id: demand.owner_id,
                            arrangement: demand.arrangement,
                        };
                        adjust_reservation_on(txn, &key, demand.quantity_cases).await?;
                        placed.push((demand, location_id, code));
                    }

                    placed.sort_by(|a, b| a.2.cmp(&b.2));

                    let list_id = Uuid::new_v4();
                    let list = pick_list::ActiveModel {
                        id: Set(list_id),
                        reference: Set(reference),
                        status: Set(PickListStatus::Released.as_str().to_string()),
                        total_items: Set(placed.len() as i32),
                        picked_items: Set(0),
                        picked_cases: Set(0),
                        created_at: Set(Utc::now()),
                        completed_at: Set(None),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut items = Vec::with_capacity(placed.len());
                    for (position, (demand, location_id, _)) in placed.into_iter().enumerate() {
                        let item = pick_list_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            pick_list_id: Set(list_id),
                            position: Set(position as i32),
                            product_id: Set(demand.product_id),
                            owner_id: Set(demand.owner_id),
                            arrangement: Set(demand.arrangement.as_str().to_string()),
                            quantity_cases: Set(demand.quantity_cases),
                            suggested_location_id: Set(location_id),
                            status: Set(PickItemStatus::Pending.as_str().to_string()),
                            picked_cases: Set(None),
                            picked_at: Set(None),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        items.push(item);
                    }

                    Ok(PickListDetail { list, items })
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(pick_list_id = %detail.list.id, total_items = detail.list.total_items, "released pick list");
        if let Err(e) = self
            .event_sender
            .send(Event::PickListReleased {
                pick_list_id: detail.list.id,
                total_items: detail.list.total_items,
            })
            .await
        {
            warn!(error = %e, "failed to emit PickListReleased event");
        }

        Ok(detail)
    }

    /// Commits one pick item: location scan, case scan, quantity, movement.
    /// The whole step is atomic; on any rejection the item stays `pending`
    /// and neither scan is remembered.
    #[instrument(skip(self))]
    pub async fn pick_item(
        &self,
        list_id: Uuid,
        item_id: Uuid,
        location_barcode: String,
        case_barcode: String,
        quantity_cases: Option<i32>,
        recorded_by: String,
    ) -> Result<PickListDetail, ServiceError> {
        // Resolve the product code up front; the catalog is read-only and
        // external to the transaction.
        let preview = PickListItem::find_by_id(item_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Pick item {} not found", item_id)))?;
        let product = self
            .catalog
            .product(preview.product_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product {} not found in catalog",
                    preview.product_id
                ))
            })?;

        let db = &*self.db_pool;
        let product_code = product.code.clone();
        let (list, item_picked_cases) = db
            .transaction::<_, (pick_list::Model, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let list = PickList::find_by_id(list_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Pick list {} not found", list_id))
                        })?;
                    if PickListStatus::parse(&list.status) != Some(PickListStatus::Released) {
                        return Err(ServiceError::InvalidStateTransition(format!(
                            "pick list {} is {}, not released",
                            list_id, list.status
                        )));
                    }

                    let item = PickListItem::find_by_id(item_id)
                        .filter(pick_list_item::Column::PickListId.eq(list_id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Pick item {} not found on list {}",
                                item_id, list_id
                            ))
                        })?;
                    if PickItemStatus::parse(&item.status) != Some(PickItemStatus::Pending) {
                        return Err(ServiceError::InvalidStateTransition(format!(
                            "pick item {} is already {}",
                            item_id, item.status
                        )));
                    }

                    // Step 1: location scan, exact code lookup.
                    record_scan(txn, list_id, &location_barcode).await?;
                    let location = Location::find()
                        .filter(location::Column::Code.eq(location_barcode.trim().to_uppercase()))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Location '{}' not found",
                                location_barcode
                            ))
                        })?;
                    if location.id != item.suggested_location_id {
                        return Err(ServiceError::ValidationError(format!(
                            "scanned location '{}' is not the suggested slot for this item",
                            location.code
                        )));
                    }

                    // Step 2: case scan, soft verification.
                    record_scan(txn, list_id, &case_barcode).await?;
                    if !case_barcode_matches(&case_barcode, &product_code) {
                        return Err(ServiceError::ValidationError(format!(
                            "case scan '{}' does not match product code '{}'",
                            case_barcode, product_code
                        )));
                    }

                    // Step 3: quantity confirmation.
                    let qty = quantity_cases.unwrap_or(item.quantity_cases);
                    if qty < 1 {
                        return Err(ServiceError::ValidationError(
                            "picked quantity must be >= 1".to_string(),
                        ));
                    }
                    if qty > item.quantity_cases {
                        return Err(ServiceError::ValidationError(format!(
                            "picked quantity {} exceeds the {} cases demanded",
                            qty, item.quantity_cases
                        )));
                    }

                    let arrangement =
                        SalesArrangement::parse(&item.arrangement).ok_or_else(|| {
                            ServiceError::InternalError(format!(
                                "pick item {} has unknown arrangement '{}'",
                                item.id, item.arrangement
                            ))
                        })?;

                    apply_movement_on(
                        txn,
                        &MovementInput {
                            movement_type: MovementType::Pick,
                            product_id: Some(item.product_id),
                            from_location_id: Some(location.id),
                            to_location_id: None,
                            from_owner_id: Some(item.owner_id),
                            to_owner_id: None,
                            arrangement,
                            from_arrangement: None,
                            quantity_cases: qty,
                            commission_percent: None,
                            reference_id: Some(list_id),
                            reference_type: Some("pick_list".to_string()),
                            reason: None,
                            recorded_by,
                        },
                    )
                    .await?;

                    // A short pick hands the unpicked remainder back.
                    if qty < item.quantity_cases {
                        let key = StockKey {
                            location_id: location.id,
                            product_id: item.product_id,
                            owner_id: item.owner_id,
                            arrangement,
                        };
                        adjust_reservation_on(txn, &key, -(item.quantity_cases - qty)).await?;
                    }

                    let mut active_item: pick_list_item::ActiveModel = item.into();
                    active_item.status = Set(PickItemStatus::Picked.as_str().to_string());
                    active_item.picked_cases = Set(Some(qty));
                    active_item.picked_at = Set(Some(Utc::now()));
                    active_item
                        .update(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let mut active_list: pick_list::ActiveModel = list.clone().into();
                    active_list.picked_items = Set(list.picked_items + 1);
                    active_list.picked_cases = Set(list.picked_cases + qty);
                    let updated_list = active_list
                        .update(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    Ok((updated_list, qty))
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            pick_list_id = %list_id,
            item_id = %item_id,
            picked_cases = item_picked_cases,
            "picked item"
        );
        if let Err(e) = self
            .event_sender
            .send(Event::PickItemPicked {
                pick_list_id: list_id,
                item_id,
                picked_cases: item_picked_cases,
            })
            .await
        {
            warn!(error = %e, "failed to emit PickItemPicked event");
        }

        self.detail(list).await
    }

    /// Completes a list once every item is picked; the list becomes
    /// immutable and a zero-delta marker movement records the completion.
    #[instrument(skip(self))]
    pub async fn complete_pick_list(
        &self,
        list_id: Uuid,
        recorded_by: String,
    ) -> Result<PickListDetail, ServiceError> {
        let db = &*self.db_pool;
        let list = db
            .transaction::<_, pick_list::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let list = PickList::find_by_id(list_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Pick list {} not found", list_id))
                        })?;
                    if PickListStatus::parse(&list.status) != Some(PickListStatus::Released) {
                        return Err(ServiceError::InvalidStateTransition(format!(
                            "pick list {} is {}, not released",
                            list_id, list.status
                        )));
                    }

                    let pending = PickListItem::find()
                        .filter(pick_list_item::Column::PickListId.eq(list_id))
                        .filter(
                            pick_list_item::Column::Status.eq(PickItemStatus::Pending.as_str()),
                        )
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if pending > 0 {
                        return Err(ServiceError::InvalidStateTransition(format!(
                            "pick list {} still has {} pending items",
                            list_id, pending
                        )));
                    }

                    apply_movement_on(
                        txn,
                        &MovementInput {
                            movement_type: MovementType::Count,
                            product_id: None,
                            from_location_id: None,
                            to_location_id: None,
                            from_owner_id: None,
                            to_owner_id: None,
                            arrangement: SalesArrangement::Purchased,
                            from_arrangement: None,
                            quantity_cases: 0,
                            commission_percent: None,
                            reference_id: Some(list_id),
                            reference_type: Some("pick_list".to_string()),
                            reason: Some("pick list completed".to_string()),
                            recorded_by,
                        },
                    )
                    .await?;

                    let mut active: pick_list::ActiveModel = list.into();
                    active.status = Set(PickListStatus::Completed.as_str().to_string());
                    active.completed_at = Set(Some(Utc::now()));
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(pick_list_id = %list_id, "completed pick list");
        if let Err(e) = self.event_sender.send(Event::PickListCompleted(list_id)).await {
            warn!(error = %e, "failed to emit PickListCompleted event");
        }

        self.detail(list).await
    }

    /// Deletes an untouched list and releases its reservations. A list with
    /// any picked item cannot be deleted; it must be completed so the picks
    /// stay on the audit trail.
    #[instrument(skip(self))]
    pub async fn delete_pick_list(&self, list_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                let list = PickList::find_by_id(list_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Pick list {} not found", list_id))
                    })?;
                if PickListStatus::parse(&list.status) == Some(PickListStatus::Completed) {
                    return Err(ServiceError::InvalidStateTransition(format!(
                        "pick list {} is completed and immutable",
                        list_id
                    )));
                }

                let items = PickListItem::find()
                    .filter(pick_list_item::Column::PickListId.eq(list_id))
                    .all(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                if items
                    .iter()
                    .any(|i| PickItemStatus::parse(&i.status) == Some(PickItemStatus::Picked))
                {
                    return Err(ServiceError::InvalidStateTransition(format!(
                        "pick list {} has picked items and can only be completed",
                        list_id
                    )));
                }

                for item in &items {
                    let arrangement =
                        SalesArrangement::parse(&item.arrangement).ok_or_else(|| {
                            ServiceError::InternalError(format!(
                                "pick item {} has unknown arrangement '{}'",
                                item.id, item.arrangement
                            ))
                        })?;
                    let key = StockKey {
                        location_id: item.suggested_location_id,
                        product_id: item.product_id,
                        owner_id: item.owner_id,
                        arrangement,
                    };
                    adjust_reservation_on(txn, &key, -item.quantity_cases).await?;
                }

                PickScan::delete_many()
                    .filter(pick_scan::Column::PickListId.eq(list_id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                PickListItem::delete_many()
                    .filter(pick_list_item::Column::PickListId.eq(list_id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                PickList::delete_by_id(list_id)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                Ok(())
            })
        })
        .await
        .map_err(ServiceError::from)?;

        info!(pick_list_id = %list_id, "deleted pick list");
        if let Err(e) = self.event_sender.send(Event::PickListDeleted(list_id)).await {
            warn!(error = %e, "failed to emit PickListDeleted event");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_pick_list(&self, list_id: Uuid) -> Result<PickListDetail, ServiceError> {
        let list = PickList::find_by_id(list_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Pick list {} not found", list_id)))?;
        self.detail(list).await
    }

    async fn detail(&self, list: pick_list::Model) -> Result<PickListDetail, ServiceError> {
        let items = PickListItem::find()
            .filter(pick_list_item::Column::PickListId.eq(list.id))
            .order_by_asc(pick_list_item::Column::Position)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(PickListDetail { list, items })
    }
}

/// Rejects a barcode already consumed in this pick session, then remembers
/// it. Runs inside the item's transaction, so a rejected pick forgets its
/// scans along with everything else.
async fn record_scan<C: sea_orm::ConnectionTrait>(
    conn: &C,
    list_id: Uuid,
    barcode: &str,
) -> Result<(), ServiceError> {
    let trimmed = barcode.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(
            "scanned barcode must not be empty".to_string(),
        ));
    }

    let seen = PickScan::find()
        .filter(pick_scan::Column::PickListId.eq(list_id))
        .filter(pick_scan::Column::Barcode.eq(trimmed))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;
    if seen.is_some() {
        return Err(ServiceError::DuplicateScan(trimmed.to_string()));
    }

    pick_scan::ActiveModel {
        id: Set(Uuid::new_v4()),
        pick_list_id: Set(list_id),
        barcode: Set(trimmed.to_string()),
        scanned_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_scan_matches_on_normalized_substring() {
        assert!(case_barcode_matches("LWIN1234567", "LWIN1234567"));
        assert!(case_barcode_matches("lwin-1234567", "LWIN1234567"));
        assert!(case_barcode_matches("CASE LWIN1234567 OF 12", "LWIN1234567"));
        // Scan shorter than the code still matches as a prefix fragment.
        assert!(case_barcode_matches("LWIN123", "LWIN1234567"));
    }

    #[test]
    fn long_unrelated_scans_pass_the_fallback() {
        assert!(case_barcode_matches("9988776655", "LWIN1234567"));
    }

    #[test]
    fn short_unrelated_scans_are_rejected() {
        assert!(!case_barcode_matches("AB1", "LWIN1234567"));
        assert!(!case_barcode_matches("", "LWIN1234567"));
        assert!(!case_barcode_matches("   ", "LWIN1234567"));
    }
}
