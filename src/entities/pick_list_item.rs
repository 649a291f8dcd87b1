use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickItemStatus {
    Pending,
    Picked,
}

impl PickItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickItemStatus::Pending => "pending",
            PickItemStatus::Picked => "picked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PickItemStatus::Pending),
            "picked" => Some(PickItemStatus::Picked),
            _ => None,
        }
    }
}

/// One demand line on a pick list. `position` follows the suggested-location
/// code ordering, a walking-path heuristic rather than a route optimizer.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pick_list_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub pick_list_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub owner_id: Uuid,
    pub arrangement: String,
    pub quantity_cases: i32,
    pub suggested_location_id: Uuid,
    pub status: String,
    pub picked_cases: Option<i32>,
    pub picked_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pick_list::Entity",
        from = "Column::PickListId",
        to = "super::pick_list::Column::Id"
    )]
    PickList,
}

impl Related<super::pick_list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PickList.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
