use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One counted line: the ledger's expectation, the operator's count, and the
/// approval verdict for the resulting discrepancy.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cycle_count_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cycle_count_id: Uuid,
    pub product_id: Uuid,
    pub owner_id: Uuid,
    pub arrangement: String,
    /// Snapshotted from the ledger when the count was created.
    pub expected_cases: i32,
    pub counted_cases: Option<i32>,
    /// counted - expected; positive means extra stock was found.
    pub discrepancy: Option<i32>,
    pub approved: Option<bool>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cycle_count::Entity",
        from = "Column::CycleCountId",
        to = "super::cycle_count::Column::Id"
    )]
    CycleCount,
}

impl Related<super::cycle_count::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CycleCount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
