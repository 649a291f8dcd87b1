use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cycle count lifecycle. Transitions are one-directional; there is no
/// reopen. Anything else is an `InvalidStateTransition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStatus {
    Pending,
    InProgress,
    Completed,
    Reconciled,
}

impl CountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountStatus::Pending => "pending",
            CountStatus::InProgress => "in_progress",
            CountStatus::Completed => "completed",
            CountStatus::Reconciled => "reconciled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CountStatus::Pending),
            "in_progress" => Some(CountStatus::InProgress),
            "completed" => Some(CountStatus::Completed),
            "reconciled" => Some(CountStatus::Reconciled),
            _ => None,
        }
    }

    /// Central transition table for the count state machine.
    pub fn can_transition_to(&self, next: CountStatus) -> bool {
        matches!(
            (self, next),
            (CountStatus::Pending, CountStatus::InProgress)
                | (CountStatus::InProgress, CountStatus::Completed)
                | (CountStatus::Completed, CountStatus::Reconciled)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cycle_counts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub location_id: Uuid,
    pub status: String,
    /// Number of items with a non-zero discrepancy, set on completion.
    pub discrepancy_items: Option<i32>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reconciled_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cycle_count_item::Entity")]
    Items,
}

impl Related<super::cycle_count_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_is_one_directional() {
        use CountStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Reconciled));

        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Reconciled.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Reconciled));
        assert!(!Pending.can_transition_to(Completed));
    }
}
