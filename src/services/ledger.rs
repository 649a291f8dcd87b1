//! Movement log and stock ledger.
//!
//! `append_movement` is the only legitimate writer of `stock_records`: it
//! validates the movement against current ledger state, inserts the immutable
//! movement row and upserts the affected stock rows in one transaction. Every
//! other component (picking, cycle counts, ownership transfers) mutates stock
//! exclusively through this module.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::catalog::ProductCatalog;
use crate::entities::{
    location::Entity as Location,
    stock_movement::{self, Entity as StockMovement, MovementType},
    stock_record::{self, Entity as StockRecord, SalesArrangement},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Retries for the optimistic version check before giving up.
const MAX_VERSION_RETRIES: u32 = 3;

/// Identity of one ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub location_id: Uuid,
    pub product_id: Uuid,
    pub owner_id: Uuid,
    pub arrangement: SalesArrangement,
}

/// Input to the append primitive. Which endpoints are required depends on the
/// movement type; `deltas` rejects malformed combinations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementInput {
    pub movement_type: MovementType,
    /// Required for every type except zero-delta `count` markers.
    pub product_id: Option<Uuid>,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub from_owner_id: Option<Uuid>,
    pub to_owner_id: Option<Uuid>,
    /// Arrangement of the credited row.
    pub arrangement: SalesArrangement,
    /// Arrangement of the debited row when it differs from `arrangement`
    /// (ownership transfers may convert the arrangement).
    pub from_arrangement: Option<SalesArrangement>,
    /// Signed for `adjust`, strictly positive otherwise.
    pub quantity_cases: i32,
    pub commission_percent: Option<Decimal>,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub reason: Option<String>,
    pub recorded_by: String,
}

/// Effect of a movement on one ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StockDelta {
    pub key: StockKey,
    pub quantity: i32,
    /// Only `pick` movements carry a reservation debit; it is clamped at
    /// zero when the row's reservation does not cover it.
    pub reserved: i32,
}

impl MovementInput {
    fn require(&self, value: Option<Uuid>, field: &str) -> Result<Uuid, ServiceError> {
        value.ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "{} is required for a {} movement",
                field,
                self.movement_type.as_str()
            ))
        })
    }

    fn require_positive(&self) -> Result<i32, ServiceError> {
        if self.quantity_cases < 1 {
            return Err(ServiceError::ValidationError(format!(
                "quantity_cases must be >= 1 for a {} movement, got {}",
                self.movement_type.as_str(),
                self.quantity_cases
            )));
        }
        Ok(self.quantity_cases)
    }

    fn key(&self, location_id: Uuid, owner_id: Uuid, product_id: Uuid) -> StockKey {
        StockKey {
            location_id,
            product_id,
            owner_id,
            arrangement: self.arrangement,
        }
    }

    fn debit_key(&self, location_id: Uuid, owner_id: Uuid, product_id: Uuid) -> StockKey {
        StockKey {
            location_id,
            product_id,
            owner_id,
            arrangement: self.from_arrangement.unwrap_or(self.arrangement),
        }
    }

    /// Pure translation of a movement into per-row quantity deltas.
    pub(crate) fn deltas(&self) -> Result<Vec<StockDelta>, ServiceError> {
        // Zero-delta markers are the only movements without a product.
        if self.movement_type == MovementType::Count {
            if self.quantity_cases < 0 {
                return Err(ServiceError::ValidationError(
                    "count movements record an observed quantity and cannot be negative"
                        .to_string(),
                ));
            }
            return Ok(vec![]);
        }

        let product = self.require(self.product_id, "product_id")?;
        match self.movement_type {
            MovementType::Receive | MovementType::RepackIn | MovementType::PalletAdd => {
                let qty = self.require_positive()?;
                let to = self.require(self.to_location_id, "to_location_id")?;
                let owner = self.require(self.to_owner_id, "to_owner_id")?;
                Ok(vec![StockDelta {
                    key: self.key(to, owner, product),
                    quantity: qty,
                    reserved: 0,
                }])
            }
            MovementType::RepackOut | MovementType::PalletRemove => {
                let qty = self.require_positive()?;
                let from = self.require(self.from_location_id, "from_location_id")?;
                let owner = self.require(self.from_owner_id, "from_owner_id")?;
                Ok(vec![StockDelta {
                    key: self.debit_key(from, owner, product),
                    quantity: -qty,
                    reserved: 0,
                }])
            }
            MovementType::Putaway | MovementType::Transfer | MovementType::PalletMove => {
                let qty = self.require_positive()?;
                let from = self.require(self.from_location_id, "from_location_id")?;
                let to = self.require(self.to_location_id, "to_location_id")?;
                if from == to {
                    return Err(ServiceError::ValidationError(
                        "from_location_id and to_location_id must differ".to_string(),
                    ));
                }
                let owner = self.require(self.from_owner_id, "from_owner_id")?;
                if let Some(to_owner) = self.to_owner_id {
                    if to_owner != owner {
                        return Err(ServiceError::ValidationError(
                            "physical moves keep the owner; use an ownership_transfer movement"
                                .to_string(),
                        ));
                    }
                }
                Ok(vec![
                    StockDelta {
                        key: self.debit_key(from, owner, product),
                        quantity: -qty,
                        reserved: 0,
                    },
                    StockDelta {
                        key: self.key(to, owner, product),
                        quantity: qty,
                        reserved: 0,
                    },
                ])
            }
            MovementType::Pick => {
                let qty = self.require_positive()?;
                let from = self.require(self.from_location_id, "from_location_id")?;
                let owner = self.require(self.from_owner_id, "from_owner_id")?;
                Ok(vec![StockDelta {
                    key: self.debit_key(from, owner, product),
                    quantity: -qty,
                    reserved: -qty,
                }])
            }
            MovementType::Adjust => {
                if self.quantity_cases == 0 {
                    return Err(ServiceError::ValidationError(
                        "adjust movements must carry a non-zero signed quantity".to_string(),
                    ));
                }
                let to = self.require(self.to_location_id, "to_location_id")?;
                let owner = self.require(self.to_owner_id, "to_owner_id")?;
                Ok(vec![StockDelta {
                    key: self.key(to, owner, product),
                    quantity: self.quantity_cases,
                    reserved: 0,
                }])
            }
            MovementType::OwnershipTransfer => {
                let qty = self.require_positive()?;
                let loc = self.require(self.from_location_id, "from_location_id")?;
                if let Some(to_loc) = self.to_location_id {
                    if to_loc != loc {
                        return Err(ServiceError::ValidationError(
                            "ownership transfers do not change physical location".to_string(),
                        ));
                    }
                }
                let from_owner = self.require(self.from_owner_id, "from_owner_id")?;
                let to_owner = self.require(self.to_owner_id, "to_owner_id")?;
                if from_owner == to_owner {
                    return Err(ServiceError::SameOwner(to_owner));
                }
                Ok(vec![
                    StockDelta {
                        key: self.debit_key(loc, from_owner, product),
                        quantity: -qty,
                        reserved: 0,
                    },
                    StockDelta {
                        key: self.key(loc, to_owner, product),
                        quantity: qty,
                        reserved: 0,
                    },
                ])
            }
            MovementType::Count => unreachable!("handled above"),
        }
    }
}

/// Rebuilds the per-row deltas of a persisted movement. Reconciliation
/// replays the log through the exact same delta table the append primitive
/// used, so the two can only disagree if someone wrote stock outside it.
pub(crate) fn replay_deltas(m: &stock_movement::Model) -> Result<Vec<StockDelta>, ServiceError> {
    let movement_type = MovementType::parse(&m.movement_type).ok_or_else(|| {
        ServiceError::InternalError(format!(
            "movement {} has unknown type '{}'",
            m.id, m.movement_type
        ))
    })?;
    let arrangement = m
        .arrangement
        .as_deref()
        .and_then(SalesArrangement::parse)
        .unwrap_or(SalesArrangement::Purchased);
    let input = MovementInput {
        movement_type,
        product_id: m.product_id,
        from_location_id: m.from_location_id,
        to_location_id: m.to_location_id,
        from_owner_id: m.from_owner_id,
        to_owner_id: m.to_owner_id,
        arrangement,
        from_arrangement: m.from_arrangement.as_deref().and_then(SalesArrangement::parse),
        quantity_cases: m.quantity_cases,
        commission_percent: m.commission_percent,
        reference_id: m.reference_id,
        reference_type: m.reference_type.clone(),
        reason: m.reason.clone(),
        recorded_by: m.recorded_by.clone(),
    };
    input.deltas()
}

/// Applies one movement on an open connection/transaction: validates
/// endpoints, inserts the movement row, upserts every affected stock row.
/// Callers that need additional work in the same transaction (picking, cycle
/// counts) use this directly; everyone else goes through
/// [`LedgerService::append_movement`].
pub(crate) async fn apply_movement_on<C: ConnectionTrait>(
    conn: &C,
    input: &MovementInput,
) -> Result<stock_movement::Model, ServiceError> {
    let deltas = input.deltas()?;

    for loc_id in [input.from_location_id, input.to_location_id]
        .into_iter()
        .flatten()
    {
        let loc = Location::find_by_id(loc_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", loc_id)))?;
        // Debiting a deactivated slot is allowed (stock must be able to
        // leave); crediting one is not.
        if !loc.active && Some(loc_id) == input.to_location_id {
            return Err(ServiceError::ValidationError(format!(
                "Location {} is deactivated and cannot receive stock",
                loc.code
            )));
        }
    }

    let movement = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        movement_type: Set(input.movement_type.as_str().to_string()),
        product_id: Set(input.product_id),
        from_location_id: Set(input.from_location_id),
        to_location_id: Set(input.to_location_id),
        from_owner_id: Set(input.from_owner_id),
        to_owner_id: Set(input.to_owner_id),
        arrangement: Set(Some(input.arrangement.as_str().to_string())),
        from_arrangement: Set(input
            .from_arrangement
            .map(|a| a.as_str().to_string())),
        quantity_cases: Set(input.quantity_cases),
        commission_percent: Set(input.commission_percent),
        reference_id: Set(input.reference_id),
        reference_type: Set(input.reference_type.clone()),
        reason: Set(input.reason.clone()),
        recorded_by: Set(input.recorded_by.clone()),
        occurred_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;

    for delta in &deltas {
        apply_delta_on(conn, delta).await?;
    }

    info!(
        movement_id = %movement.id,
        movement_type = %movement.movement_type,
        product_id = ?movement.product_id,
        quantity_cases = movement.quantity_cases,
        "appended movement"
    );

    Ok(movement)
}

/// Upserts one ledger row under the optimistic version discipline.
async fn apply_delta_on<C: ConnectionTrait>(
    conn: &C,
    delta: &StockDelta,
) -> Result<(), ServiceError> {
    let key = &delta.key;
    let mut last_contended = Uuid::nil();

    for _ in 0..MAX_VERSION_RETRIES {
        let existing = find_record(conn, key).await?;

        let Some(record) = existing else {
            if delta.quantity < 0 {
                return Err(ServiceError::InsufficientStock(format!(
                    "No stock of product {} for owner {} at location {}",
                    key.product_id, key.owner_id, key.location_id
                )));
            }
            let new_record = stock_record::ActiveModel {
                id: Set(Uuid::new_v4()),
                location_id: Set(key.location_id),
                product_id: Set(key.product_id),
                owner_id: Set(key.owner_id),
                arrangement: Set(key.arrangement.as_str().to_string()),
                quantity_cases: Set(delta.quantity),
                reserved_cases: Set(0),
                expires_at: Set(None),
                version: Set(1),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
            };
            new_record
                .insert(conn)
                .await
                .map_err(ServiceError::db_error)?;
            return Ok(());
        };

        let new_quantity = record
            .quantity_cases
            .checked_add(delta.quantity)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "quantity of product {} at location {} would overflow",
                    key.product_id, key.location_id
                ))
            })?;
        // A pick consumes its reservation; a reservation shortfall clamps at
        // zero rather than going negative.
        let new_reserved = (record.reserved_cases + delta.reserved).max(0);

        if new_quantity < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "{} cases of product {} on hand at location {}, movement debits {}",
                record.quantity_cases,
                key.product_id,
                key.location_id,
                -delta.quantity
            )));
        }
        if new_reserved > new_quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "{} cases of product {} available at location {} ({} reserved), movement debits {}",
                record.available_cases(),
                key.product_id,
                key.location_id,
                record.reserved_cases,
                -delta.quantity
            )));
        }

        let update = StockRecord::update_many()
            .col_expr(stock_record::Column::QuantityCases, Expr::value(new_quantity))
            .col_expr(stock_record::Column::ReservedCases, Expr::value(new_reserved))
            .col_expr(
                stock_record::Column::Version,
                Expr::value(record.version + 1),
            )
            .col_expr(stock_record::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stock_record::Column::Id.eq(record.id))
            .filter(stock_record::Column::Version.eq(record.version))
            .exec(conn)
            .await
            .map_err(ServiceError::db_error)?;

        if update.rows_affected == 1 {
            return Ok(());
        }
        // Version moved under us; re-read and retry.
        last_contended = record.id;
        warn!(stock_record_id = %record.id, "version conflict on stock record, retrying");
    }

    Err(ServiceError::ConcurrentModification(last_contended))
}

/// Adjusts only the reservation of one ledger row (positive = reserve,
/// negative = release). Reservations are not movements: they commit cases to
/// an open pick without changing what is physically on hand.
pub(crate) async fn adjust_reservation_on<C: ConnectionTrait>(
    conn: &C,
    key: &StockKey,
    delta: i32,
) -> Result<stock_record::Model, ServiceError> {
    let mut last_contended = Uuid::nil();

    for _ in 0..MAX_VERSION_RETRIES {
        let record = find_record(conn, key).await?.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No stock record for product {} / owner {} at location {}",
                key.product_id, key.owner_id, key.location_id
            ))
        })?;

        let new_reserved = record.reserved_cases.checked_add(delta).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "reservation of product {} at location {} would overflow",
                key.product_id, key.location_id
            ))
        })?;
        if new_reserved < 0 {
            return Err(ServiceError::ValidationError(format!(
                "release of {} exceeds the {} reserved cases",
                -delta, record.reserved_cases
            )));
        }
        if new_reserved > record.quantity_cases {
            return Err(ServiceError::InsufficientStock(format!(
                "{} cases of product {} available at location {}, reservation needs {}",
                record.available_cases(),
                key.product_id,
                key.location_id,
                delta
            )));
        }

        let update = StockRecord::update_many()
            .col_expr(stock_record::Column::ReservedCases, Expr::value(new_reserved))
            .col_expr(
                stock_record::Column::Version,
                Expr::value(record.version + 1),
            )
            .col_expr(stock_record::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stock_record::Column::Id.eq(record.id))
            .filter(stock_record::Column::Version.eq(record.version))
            .exec(conn)
            .await
            .map_err(ServiceError::db_error)?;

        if update.rows_affected == 1 {
            let mut updated = record;
            updated.reserved_cases = new_reserved;
            updated.version += 1;
            return Ok(updated);
        }
        last_contended = record.id;
        warn!(stock_record_id = %record.id, "version conflict on reservation, retrying");
    }

    Err(ServiceError::ConcurrentModification(last_contended))
}

pub(crate) async fn find_record<C: ConnectionTrait>(
    conn: &C,
    key: &StockKey,
) -> Result<Option<stock_record::Model>, ServiceError> {
    StockRecord::find()
        .filter(stock_record::Column::LocationId.eq(key.location_id))
        .filter(stock_record::Column::ProductId.eq(key.product_id))
        .filter(stock_record::Column::OwnerId.eq(key.owner_id))
        .filter(stock_record::Column::Arrangement.eq(key.arrangement.as_str()))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// One ledger row as surfaced to callers, with the derived availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRowSummary {
    pub id: Uuid,
    pub location_id: Uuid,
    pub product_id: Uuid,
    pub owner_id: Uuid,
    pub arrangement: String,
    pub quantity_cases: i32,
    pub reserved_cases: i32,
    pub available_cases: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<stock_record::Model> for StockRowSummary {
    fn from(model: stock_record::Model) -> Self {
        let available_cases = model.available_cases();
        Self {
            id: model.id,
            location_id: model.location_id,
            product_id: model.product_id,
            owner_id: model.owner_id,
            arrangement: model.arrangement,
            quantity_cases: model.quantity_cases,
            reserved_cases: model.reserved_cases,
            available_cases,
            expires_at: model.expires_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockFilter {
    pub location_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    /// Zero-quantity rows are retained in the ledger; include them on demand.
    #[serde(default)]
    pub include_empty: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockSnapshot {
    pub records: Vec<StockRowSummary>,
    pub total_cases: i64,
    pub reserved_cases: i64,
    pub available_cases: i64,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementFilter {
    pub movement_type: Option<String>,
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub reference_id: Option<Uuid>,
    pub limit: Option<u64>,
}

/// Service over the movement log and stock ledger.
#[derive(Clone)]
pub struct LedgerService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    catalog: Arc<dyn ProductCatalog>,
}

impl LedgerService {
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

    /// Appends a movement and updates the ledger atomically.
    #[instrument(skip(self))]
    pub async fn append_movement(
        &self,
        input: MovementInput,
    ) -> Result<stock_movement::Model, ServiceError> {
        // Every quantity-affecting movement names a product; it has to be one
        // the catalog knows about.
        if let Some(product_id) = input.product_id {
            self.catalog
                .product(product_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", product_id))
                })?;
        }

        let db = &*self.db_pool;
        let to_apply = input.clone();
        let movement = db
            .transaction::<_, stock_movement::Model, ServiceError>(move |txn| {
                Box::pin(async move { apply_movement_on(txn, &to_apply).await })
            })
            .await
            .map_err(ServiceError::from)?;

        // Post-commit notification; the movement is durable regardless.
        if let Err(e) = self
            .event_sender
            .send(Event::MovementAppended {
                movement_id: movement.id,
                movement_type: movement.movement_type.clone(),
                product_id: movement.product_id,
                quantity_cases: movement.quantity_cases,
            })
            .await
        {
            warn!(error = %e, "failed to emit MovementAppended event");
        }

        Ok(movement)
    }

    /// Commits available cases to an open pick.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        key: StockKey,
        quantity_cases: i32,
    ) -> Result<stock_record::Model, ServiceError> {
        if quantity_cases < 1 {
            return Err(ServiceError::ValidationError(
                "reservation quantity must be >= 1".to_string(),
            ));
        }
        let db = &*self.db_pool;
        db.transaction::<_, stock_record::Model, ServiceError>(move |txn| {
            Box::pin(async move { adjust_reservation_on(txn, &key, quantity_cases).await })
        })
        .await
        .map_err(ServiceError::from)
    }

    /// Returns previously reserved cases to availability.
    #[instrument(skip(self))]
    pub async fn release(
        &self,
        key: StockKey,
        quantity_cases: i32,
    ) -> Result<stock_record::Model, ServiceError> {
        if quantity_cases < 1 {
            return Err(ServiceError::ValidationError(
                "release quantity must be >= 1".to_string(),
            ));
        }
        let db = &*self.db_pool;
        db.transaction::<_, stock_record::Model, ServiceError>(move |txn| {
            Box::pin(async move { adjust_reservation_on(txn, &key, -quantity_cases).await })
        })
        .await
        .map_err(ServiceError::from)
    }

    /// Current ledger rows and totals for a scope.
    #[instrument(skip(self))]
    pub async fn get_stock_snapshot(
        &self,
        filter: StockFilter,
    ) -> Result<StockSnapshot, ServiceError> {
        let db = &*self.db_pool;

        let mut query = StockRecord::find();
        if let Some(location_id) = filter.location_id {
            query = query.filter(stock_record::Column::LocationId.eq(location_id));
        }
        if let Some(product_id) = filter.product_id {
            query = query.filter(stock_record::Column::ProductId.eq(product_id));
        }
        if let Some(owner_id) = filter.owner_id {
            query = query.filter(stock_record::Column::OwnerId.eq(owner_id));
        }
        if !filter.include_empty {
            query = query.filter(
                Condition::any()
                    .add(stock_record::Column::QuantityCases.gt(0))
                    .add(stock_record::Column::ReservedCases.gt(0)),
            );
        }

        let records = query
            .order_by_asc(stock_record::Column::LocationId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let total_cases = records.iter().map(|r| r.quantity_cases as i64).sum();
        let reserved_cases = records.iter().map(|r| r.reserved_cases as i64).sum();
        let available_cases = records.iter().map(|r| r.available_cases() as i64).sum();

        Ok(StockSnapshot {
            records: records.into_iter().map(StockRowSummary::from).collect(),
            total_cases,
            reserved_cases,
            available_cases,
            taken_at: Utc::now(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_movement(&self, id: Uuid) -> Result<stock_movement::Model, ServiceError> {
        StockMovement::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Movement {} not found", id)))
    }

    /// Newest-first slice of the movement log.
    #[instrument(skip(self))]
    pub async fn get_movement_history(
        &self,
        filter: MovementFilter,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let limit = filter.limit.unwrap_or(100);
        if limit == 0 || limit > 1000 {
            return Err(ServiceError::ValidationError(
                "limit must be between 1 and 1000".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let mut query = StockMovement::find();

        if let Some(ref movement_type) = filter.movement_type {
            if MovementType::parse(movement_type).is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "unknown movement type '{}'",
                    movement_type
                )));
            }
            query = query.filter(stock_movement::Column::MovementType.eq(movement_type.as_str()));
        }
        if let Some(product_id) = filter.product_id {
            query = query.filter(stock_movement::Column::ProductId.eq(product_id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(
                Condition::any()
                    .add(stock_movement::Column::FromLocationId.eq(location_id))
                    .add(stock_movement::Column::ToLocationId.eq(location_id)),
            );
        }
        if let Some(owner_id) = filter.owner_id {
            query = query.filter(
                Condition::any()
                    .add(stock_movement::Column::FromOwnerId.eq(owner_id))
                    .add(stock_movement::Column::ToOwnerId.eq(owner_id)),
            );
        }
        if let Some(reference_id) = filter.reference_id {
            query = query.filter(stock_movement::Column::ReferenceId.eq(reference_id));
        }

        query
            .order_by_desc(stock_movement::Column::OccurredAt)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}
