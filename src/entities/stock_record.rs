use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Commercial arrangement under which stock is held for an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesArrangement {
    Consignment,
    Purchased,
}

impl SalesArrangement {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesArrangement::Consignment => "consignment",
            SalesArrangement::Purchased => "purchased",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "consignment" => Some(SalesArrangement::Consignment),
            "purchased" => Some(SalesArrangement::Purchased),
            _ => None,
        }
    }
}

/// One ledger row: quantity of a product held at a location for an owner.
///
/// Written exclusively by `services::ledger`; every quantity change is backed
/// by a row in `stock_movements`. `available` is derived, never stored, so it
/// cannot drift from `quantity - reserved`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub location_id: Uuid,
    pub product_id: Uuid,
    pub owner_id: Uuid,
    pub arrangement: String,
    pub quantity_cases: i32,
    pub reserved_cases: i32,
    pub expires_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token; bumped on every write.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Cases on hand that are not committed to an open pick.
    pub fn available_cases(&self) -> i32 {
        self.quantity_cases - self.reserved_cases
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
