//! Cycle counting: snapshot a location, count it blind, then reconcile the
//! approved discrepancies back into the ledger as `adjust` movements.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{
    cycle_count::{self, CountStatus, Entity as CycleCount},
    cycle_count_item::{self, Entity as CycleCountItem},
    location::Entity as Location,
    stock_movement::MovementType,
    stock_record::{self, Entity as StockRecord, SalesArrangement},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::ledger::{apply_movement_on, MovementInput};

#[derive(Debug, Clone, Serialize)]
pub struct CycleCountDetail {
    pub count: cycle_count::Model,
    pub items: Vec<cycle_count_item::Model>,
}

#[derive(Clone)]
pub struct CycleCountService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CycleCountService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Snapshots every stock row at the location into count items. Zero-case
    /// rows are included: confirming an empty slot is itself a finding. A
    /// location with no rows yields a count with no items, which is allowed.
    #[instrument(skip(self))]
    pub async fn create_count(
        &self,
        location_id: Uuid,
        created_by: String,
    ) -> Result<CycleCountDetail, ServiceError> {
        let db = &*self.db_pool;
        let detail = db
            .transaction::<_, CycleCountDetail, ServiceError>(move |txn| {
                Box::pin(async move {
                    Location::find_by_id(location_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Location {} not found", location_id))
                        })?;

                    let records = StockRecord::find()
                        .filter(stock_record::Column::LocationId.eq(location_id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let count = cycle_count::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        location_id: Set(location_id),
                        status: Set(CountStatus::Pending.as_str().to_string()),
                        discrepancy_items: Set(None),
                        created_by: Set(created_by),
                        created_at: Set(Utc::now()),
                        started_at: Set(None),
                        completed_at: Set(None),
                        reconciled_at: Set(None),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut items = Vec::with_capacity(records.len());
                    for record in records {
                        let item = cycle_count_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            cycle_count_id: Set(count.id),
                            product_id: Set(record.product_id),
                            owner_id: Set(record.owner_id),
                            arrangement: Set(record.arrangement),
                            // The operator counts physical cases; reserved
                            // stock is still on the shelf.
                            expected_cases: Set(record.quantity_cases),
                            counted_cases: Set(None),
                            discrepancy: Set(None),
                            approved: Set(None),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        items.push(item);
                    }

                    Ok(CycleCountDetail { count, items })
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            cycle_count_id = %detail.count.id,
            location_id = %location_id,
            items = detail.items.len(),
            "created cycle count"
        );
        Ok(detail)
    }

    #[instrument(skip(self))]
    pub async fn start_count(&self, count_id: Uuid) -> Result<CycleCountDetail, ServiceError> {
        let count = self
            .transition(count_id, CountStatus::InProgress, |active| {
                active.started_at = Set(Some(Utc::now()));
            })
            .await?;

        if let Err(e) = self.event_sender.send(Event::CycleCountStarted(count_id)).await {
            warn!(error = %e, "failed to emit CycleCountStarted event");
        }
        self.detail(count).await
    }

    /// Records an operator's tally for one item. Re-counting a line simply
    /// overwrites the previous figure; nothing is final until completion.
    #[instrument(skip(self))]
    pub async fn record_item(
        &self,
        count_id: Uuid,
        item_id: Uuid,
        counted_cases: i32,
    ) -> Result<cycle_count_item::Model, ServiceError> {
        if counted_cases < 0 {
            return Err(ServiceError::ValidationError(
                "counted_cases cannot be negative".to_string(),
            ));
        }

        let count = self.load(count_id).await?;
        if CountStatus::parse(&count.status) != Some(CountStatus::InProgress) {
            return Err(ServiceError::InvalidStateTransition(format!(
                "cycle count {} is {}; items can only be recorded while in progress",
                count_id, count.status
            )));
        }

        let item = CycleCountItem::find_by_id(item_id)
            .filter(cycle_count_item::Column::CycleCountId.eq(count_id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Count item {} not found on cycle count {}",
                    item_id, count_id
                ))
            })?;

        let expected = item.expected_cases;
        let mut active: cycle_count_item::ActiveModel = item.into();
        active.counted_cases = Set(Some(counted_cases));
        active.discrepancy = Set(Some(counted_cases - expected));
        active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Completes the count. Every item must have a tally; the number of
    /// non-zero discrepancies is frozen onto the count.
    #[instrument(skip(self))]
    pub async fn complete_count(&self, count_id: Uuid) -> Result<CycleCountDetail, ServiceError> {
        let items = self.items(count_id).await?;
        let uncounted = items.iter().filter(|i| i.counted_cases.is_none()).count();
        if uncounted > 0 {
            return Err(ServiceError::ValidationError(format!(
                "cycle count {} has {} uncounted items",
                count_id, uncounted
            )));
        }
        let discrepancies = items
            .iter()
            .filter(|i| i.discrepancy.unwrap_or(0) != 0)
            .count() as i32;

        let count = self
            .transition(count_id, CountStatus::Completed, |active| {
                active.completed_at = Set(Some(Utc::now()));
                active.discrepancy_items = Set(Some(discrepancies));
            })
            .await?;

        info!(cycle_count_id = %count_id, discrepancy_items = discrepancies, "completed cycle count");
        if let Err(e) = self
            .event_sender
            .send(Event::CycleCountCompleted {
                cycle_count_id: count_id,
                discrepancy_items: discrepancies,
            })
            .await
        {
            warn!(error = %e, "failed to emit CycleCountCompleted event");
        }
        self.detail(count).await
    }

    /// Applies the approved discrepancies as `adjust` movements, one per
    /// item, in a single transaction. Items missing from `approvals` are
    /// treated as rejected; rejected discrepancies stay on record but do not
    /// touch stock.
    #[instrument(skip(self, approvals))]
    pub async fn reconcile_count(
        &self,
        count_id: Uuid,
        approvals: HashMap<Uuid, bool>,
        recorded_by: String,
    ) -> Result<CycleCountDetail, ServiceError> {
        let db = &*self.db_pool;
        let (count, adjustments) = db
            .transaction::<_, (cycle_count::Model, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let count = CycleCount::find_by_id(count_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Cycle count {} not found", count_id))
                        })?;
                    let status = CountStatus::parse(&count.status).ok_or_else(|| {
                        ServiceError::InternalError(format!(
                            "cycle count {} has unknown status '{}'",
                            count_id, count.status
                        ))
                    })?;
                    if !status.can_transition_to(CountStatus::Reconciled) {
                        return Err(ServiceError::InvalidStateTransition(format!(
                            "cycle count {} is {} and cannot be reconciled",
                            count_id, count.status
                        )));
                    }

                    // Claim the terminal status before touching stock. The
                    // filter re-checks the status we read, so of two racing
                    // reconcile calls only one applies the adjustments.
                    let current_status = count.status.clone();
                    let mut active: cycle_count::ActiveModel = count.into();
                    active.status = Set(CountStatus::Reconciled.as_str().to_string());
                    active.reconciled_at = Set(Some(Utc::now()));
                    let count = CycleCount::update(active)
                        .filter(cycle_count::Column::Status.eq(current_status))
                        .exec(txn)
                        .await
                        .map_err(|e| match e {
                            DbErr::RecordNotUpdated => ServiceError::InvalidStateTransition(
                                format!("cycle count {} was reconciled concurrently", count_id),
                            ),
                            e => ServiceError::db_error(e),
                        })?;

                    let items = CycleCountItem::find()
                        .filter(cycle_count_item::Column::CycleCountId.eq(count_id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let mut adjustments = 0;
                    for item in items {
                        let discrepancy = item.discrepancy.unwrap_or(0);
                        let approved = discrepancy != 0
                            && approvals.get(&item.id).copied().unwrap_or(false);

                        if approved {
                            let arrangement = SalesArrangement::parse(&item.arrangement)
                                .ok_or_else(|| {
                                    ServiceError::InternalError(format!(
                                        "count item {} has unknown arrangement '{}'",
                                        item.id, item.arrangement
                                    ))
                                })?;
                            apply_movement_on(
                                txn,
                                &MovementInput {
                                    movement_type: MovementType::Adjust,
                                    product_id: Some(item.product_id),
                                    from_location_id: None,
                                    to_location_id: Some(count.location_id),
                                    from_owner_id: None,
                                    to_owner_id: Some(item.owner_id),
                                    arrangement,
                                    from_arrangement: None,
                                    quantity_cases: discrepancy,
                                    commission_percent: None,
                                    reference_id: Some(count_id),
                                    reference_type: Some("cycle_count".to_string()),
                                    reason: Some("cycle count reconciliation".to_string()),
                                    recorded_by: recorded_by.clone(),
                                },
                            )
                            .await?;
                            adjustments += 1;
                        }

                        let mut active: cycle_count_item::ActiveModel = item.into();
                        active.approved = Set(Some(approved));
                        active.update(txn).await.map_err(ServiceError::db_error)?;
                    }

                    Ok((count, adjustments))
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(cycle_count_id = %count_id, adjustments_applied = adjustments, "reconciled cycle count");
        if let Err(e) = self
            .event_sender
            .send(Event::CycleCountReconciled {
                cycle_count_id: count_id,
                adjustments_applied: adjustments,
            })
            .await
        {
            warn!(error = %e, "failed to emit CycleCountReconciled event");
        }
        self.detail(count).await
    }

    #[instrument(skip(self))]
    pub async fn get_count(&self, count_id: Uuid) -> Result<CycleCountDetail, ServiceError> {
        let count = self.load(count_id).await?;
        self.detail(count).await
    }

    async fn load(&self, count_id: Uuid) -> Result<cycle_count::Model, ServiceError> {
        CycleCount::find_by_id(count_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Cycle count {} not found", count_id)))
    }

    async fn items(&self, count_id: Uuid) -> Result<Vec<cycle_count_item::Model>, ServiceError> {
        CycleCountItem::find()
            .filter(cycle_count_item::Column::CycleCountId.eq(count_id))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    async fn detail(&self, count: cycle_count::Model) -> Result<CycleCountDetail, ServiceError> {
        let items = self.items(count.id).await?;
        Ok(CycleCountDetail { count, items })
    }

    /// Status update guarded by the transition table.
    async fn transition<F>(
        &self,
        count_id: Uuid,
        next: CountStatus,
        stamp: F,
    ) -> Result<cycle_count::Model, ServiceError>
    where
        F: FnOnce(&mut cycle_count::ActiveModel),
    {
        let count = self.load(count_id).await?;
        let current = CountStatus::parse(&count.status).ok_or_else(|| {
            ServiceError::InternalError(format!(
                "cycle count {} has unknown status '{}'",
                count_id, count.status
            ))
        })?;
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidStateTransition(format!(
                "cycle count {} cannot move from {} to {}",
                count_id,
                current.as_str(),
                next.as_str()
            )));
        }

        let mut active: cycle_count::ActiveModel = count.into();
        active.status = Set(next.as_str().to_string());
        stamp(&mut active);
        // Guarded by the status we read; a concurrent transition away from it
        // turns this update into a no-op.
        CycleCount::update(active)
            .filter(cycle_count::Column::Status.eq(current.as_str()))
            .exec(&*self.db_pool)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => ServiceError::InvalidStateTransition(format!(
                    "cycle count {} changed status concurrently",
                    count_id
                )),
                e => ServiceError::db_error(e),
            })
    }
}
