//! Alert entity - A threshold watching the spend of one category allocation.
//!
//! Whether an alert is triggered is computed on read and never stored.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What the alert threshold is compared against
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum AlertType {
    /// Percentage of the allocated amount already spent
    #[sea_orm(string_value = "percentage")]
    Percentage,
    /// Absolute amount spent
    #[sea_orm(string_value = "amount")]
    Amount,
    /// Amount left in the allocation
    #[sea_orm(string_value = "remaining")]
    Remaining,
}

/// Alert database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    /// Unique identifier for the alert
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Allocation being watched
    pub allocation_id: i64,
    /// Kind of threshold
    pub alert_type: AlertType,
    /// Threshold value (a percentage or an amount depending on `alert_type`)
    pub threshold: Decimal,
    /// Inactive alerts never trigger
    pub active: bool,
    /// When the alert was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Alert and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each alert watches one allocation
    #[sea_orm(
        belongs_to = "super::category_allocation::Entity",
        from = "Column::AllocationId",
        to = "super::category_allocation::Column::Id"
    )]
    Allocation,
}

impl Related<super::category_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
