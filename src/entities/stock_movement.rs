use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every quantity-affecting event in the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Receive,
    Putaway,
    Transfer,
    Pick,
    Adjust,
    Count,
    OwnershipTransfer,
    RepackIn,
    RepackOut,
    PalletAdd,
    PalletRemove,
    PalletMove,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Receive => "receive",
            MovementType::Putaway => "putaway",
            MovementType::Transfer => "transfer",
            MovementType::Pick => "pick",
            MovementType::Adjust => "adjust",
            MovementType::Count => "count",
            MovementType::OwnershipTransfer => "ownership_transfer",
            MovementType::RepackIn => "repack_in",
            MovementType::RepackOut => "repack_out",
            MovementType::PalletAdd => "pallet_add",
            MovementType::PalletRemove => "pallet_remove",
            MovementType::PalletMove => "pallet_move",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "receive" => Some(MovementType::Receive),
            "putaway" => Some(MovementType::Putaway),
            "transfer" => Some(MovementType::Transfer),
            "pick" => Some(MovementType::Pick),
            "adjust" => Some(MovementType::Adjust),
            "count" => Some(MovementType::Count),
            "ownership_transfer" => Some(MovementType::OwnershipTransfer),
            "repack_in" => Some(MovementType::RepackIn),
            "repack_out" => Some(MovementType::RepackOut),
            "pallet_add" => Some(MovementType::PalletAdd),
            "pallet_remove" => Some(MovementType::PalletRemove),
            "pallet_move" => Some(MovementType::PalletMove),
            _ => None,
        }
    }
}

/// Immutable movement fact. The crate exposes no update or delete path for
/// this table; corrections are new offsetting movements.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub movement_type: String,
    /// None only for zero-delta markers (pick-list completion).
    pub product_id: Option<Uuid>,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub from_owner_id: Option<Uuid>,
    pub to_owner_id: Option<Uuid>,
    /// Arrangement of the credited row.
    pub arrangement: Option<String>,
    /// Arrangement of the debited row when it differs (ownership transfers
    /// may convert consignment stock to purchased and vice versa).
    pub from_arrangement: Option<String>,
    /// Signed only for `adjust`; strictly positive for every other type.
    pub quantity_cases: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub commission_percent: Option<Decimal>,
    /// Weak back-reference for audit: pick-list, cycle-count or transfer id.
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub reason: Option<String>,
    pub recorded_by: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr> {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.occurred_at {
            active_model.occurred_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_type_round_trips_through_strings() {
        for t in [
            MovementType::Receive,
            MovementType::Putaway,
            MovementType::Transfer,
            MovementType::Pick,
            MovementType::Adjust,
            MovementType::Count,
            MovementType::OwnershipTransfer,
            MovementType::RepackIn,
            MovementType::RepackOut,
            MovementType::PalletAdd,
            MovementType::PalletRemove,
            MovementType::PalletMove,
        ] {
            assert_eq!(MovementType::parse(t.as_str()), Some(t));
        }
        assert_eq!(MovementType::parse("teleport"), None);
    }
}
