use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical kind of a storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Rack,
    Floor,
    Receiving,
    Shipping,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Rack => "rack",
            LocationKind::Floor => "floor",
            LocationKind::Receiving => "receiving",
            LocationKind::Shipping => "shipping",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rack" => Some(LocationKind::Rack),
            "floor" => Some(LocationKind::Floor),
            "receiving" => Some(LocationKind::Receiving),
            "shipping" => Some(LocationKind::Shipping),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Unique, immutable slot code, e.g. "A-01-02" or "RECEIVING".
    pub code: String,
    pub aisle: Option<String>,
    pub bay: Option<i32>,
    pub level: Option<i32>,
    pub kind: String,
    pub case_capacity: Option<i32>,
    pub requires_forklift: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_record::Entity")]
    StockRecords,
}

impl Related<super::stock_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
