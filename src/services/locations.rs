//! Location registry: the addressable storage slots every other component
//! resolves against.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{
    location::{self, Entity as Location, LocationKind},
    stock_record::{self, Entity as StockRecord},
};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
    /// Unique slot code; immutable once created.
    pub code: String,
    pub aisle: Option<String>,
    pub bay: Option<i32>,
    pub level: Option<i32>,
    pub kind: LocationKind,
    pub case_capacity: Option<i32>,
    #[serde(default)]
    pub requires_forklift: bool,
}

#[derive(Clone)]
pub struct LocationService {
    db_pool: Arc<DatabaseConnection>,
}

impl LocationService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, new: NewLocation) -> Result<location::Model, ServiceError> {
        let code = new.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "location code must not be empty".to_string(),
            ));
        }
        if let Some(capacity) = new.case_capacity {
            if capacity < 1 {
                return Err(ServiceError::ValidationError(
                    "case_capacity must be >= 1 when given".to_string(),
                ));
            }
        }

        let db = &*self.db_pool;
        let duplicate = Location::find()
            .filter(location::Column::Code.eq(code.as_str()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "location code '{}' already exists",
                code
            )));
        }

        let model = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.clone()),
            aisle: Set(new.aisle),
            bay: Set(new.bay),
            level: Set(new.level),
            kind: Set(new.kind.as_str().to_string()),
            case_capacity: Set(new.case_capacity),
            requires_forklift: Set(new.requires_forklift),
            active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(location_id = %model.id, code = %code, "created location");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<location::Model, ServiceError> {
        Location::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", id)))
    }

    /// Exact lookup by slot code, as produced by a location barcode scan.
    #[instrument(skip(self))]
    pub async fn get_by_code(&self, code: &str) -> Result<location::Model, ServiceError> {
        let normalized = code.trim().to_uppercase();
        Location::find()
            .filter(location::Column::Code.eq(normalized.as_str()))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Location '{}' not found", normalized)))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<location::Model>, ServiceError> {
        let mut query = Location::find();
        if !include_inactive {
            query = query.filter(location::Column::Active.eq(true));
        }
        query
            .order_by_asc(location::Column::Code)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Takes a slot out of rotation. Stock already there stays pickable.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<location::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get(id).await?;

        let mut active: location::ActiveModel = existing.into();
        active.active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Removes a slot entirely. Refused while any ledger row at the location
    /// still carries quantity or a reservation.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get(id).await?;

        let occupied = StockRecord::find()
            .filter(stock_record::Column::LocationId.eq(id))
            .filter(
                Condition::any()
                    .add(stock_record::Column::QuantityCases.gt(0))
                    .add(stock_record::Column::ReservedCases.gt(0)),
            )
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if occupied.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "location '{}' still holds stock and cannot be deleted",
                existing.code
            )));
        }

        Location::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        info!(location_id = %id, code = %existing.code, "deleted location");
        Ok(())
    }
}
