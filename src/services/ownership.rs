//! Ownership transfers: title changes over stock that never moves a case.
//!
//! The commission rules follow the commercial model: consignment stock sells
//! with a commission percentage attached, purchased stock was bought outright
//! and carries none.

use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::catalog::PartnerDirectory;
use crate::entities::{
    stock_movement::{self, MovementType},
    stock_record::{Entity as StockRecord, SalesArrangement},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::ledger::{LedgerService, MovementInput};

/// Request to retitle cases from a stock row to another owner.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub stock_record_id: Uuid,
    pub to_owner_id: Uuid,
    pub quantity_cases: i32,
    /// Arrangement the stock takes under the new owner; a consignment row
    /// sold to the buyer becomes `purchased`.
    pub arrangement: SalesArrangement,
    pub commission_percent: Option<Decimal>,
    pub justification: Option<String>,
    pub recorded_by: String,
}

#[derive(Clone)]
pub struct OwnershipService {
    ledger: LedgerService,
    db_pool: Arc<sea_orm::DatabaseConnection>,
    event_sender: EventSender,
    partners: Arc<dyn PartnerDirectory>,
}

impl OwnershipService {
    pub fn new(
        ledger: LedgerService,
        db_pool: Arc<sea_orm::DatabaseConnection>,
        event_sender: EventSender,
        partners: Arc<dyn PartnerDirectory>,
    ) -> Self {
        Self {
            ledger,
            db_pool,
            event_sender,
            partners,
        }
    }

    /// Transfers title over up to the row's available cases. Reserved cases
    /// are promised to pickers and cannot change hands.
    #[instrument(skip(self, request))]
    pub async fn transfer(
        &self,
        request: TransferRequest,
    ) -> Result<stock_movement::Model, ServiceError> {
        if request.quantity_cases < 1 {
            return Err(ServiceError::ValidationError(
                "transfer quantity must be >= 1 case".to_string(),
            ));
        }
        match request.arrangement {
            SalesArrangement::Consignment => {
                let pct = request.commission_percent.ok_or_else(|| {
                    ServiceError::ValidationError(
                        "consignment transfers require a commission_percent".to_string(),
                    )
                })?;
                if pct < Decimal::ZERO || pct > Decimal::from(100) {
                    return Err(ServiceError::ValidationError(format!(
                        "commission_percent must be between 0 and 100, got {}",
                        pct
                    )));
                }
            }
            SalesArrangement::Purchased => {
                if request.commission_percent.is_some() {
                    return Err(ServiceError::ValidationError(
                        "purchased transfers do not carry a commission".to_string(),
                    ));
                }
            }
        }

        // Title can only pass to a partner the directory knows.
        self.partners
            .partner(request.to_owner_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Partner {} not found", request.to_owner_id))
            })?;

        let record = StockRecord::find_by_id(request.stock_record_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Stock record {} not found",
                    request.stock_record_id
                ))
            })?;
        if record.owner_id == request.to_owner_id {
            return Err(ServiceError::SameOwner(request.to_owner_id));
        }
        if request.quantity_cases > record.available_cases() {
            return Err(ServiceError::InsufficientStock(format!(
                "stock record {} has {} available cases, cannot transfer {}",
                record.id,
                record.available_cases(),
                request.quantity_cases
            )));
        }
        let from_arrangement = SalesArrangement::parse(&record.arrangement).ok_or_else(|| {
            ServiceError::InternalError(format!(
                "stock record {} has unknown arrangement '{}'",
                record.id, record.arrangement
            ))
        })?;

        // The available-cases check above is advisory; the ledger re-checks
        // under its version guard and stays the source of truth.
        let movement = self
            .ledger
            .append_movement(MovementInput {
                movement_type: MovementType::OwnershipTransfer,
                product_id: Some(record.product_id),
                from_location_id: Some(record.location_id),
                to_location_id: None,
                from_owner_id: Some(record.owner_id),
                to_owner_id: Some(request.to_owner_id),
                arrangement: request.arrangement,
                from_arrangement: (from_arrangement != request.arrangement)
                    .then_some(from_arrangement),
                quantity_cases: request.quantity_cases,
                commission_percent: request.commission_percent,
                reference_id: None,
                reference_type: None,
                reason: request.justification,
                recorded_by: request.recorded_by,
            })
            .await?;

        info!(
            movement_id = %movement.id,
            from_owner_id = %record.owner_id,
            to_owner_id = %request.to_owner_id,
            quantity_cases = request.quantity_cases,
            "transferred ownership"
        );
        if let Err(e) = self
            .event_sender
            .send(Event::OwnershipTransferred {
                movement_id: movement.id,
                from_owner_id: record.owner_id,
                to_owner_id: request.to_owner_id,
                quantity_cases: request.quantity_cases,
            })
            .await
        {
            warn!(error = %e, "failed to emit OwnershipTransferred event");
        }

        Ok(movement)
    }
}
