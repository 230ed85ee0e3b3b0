//! Expense entity - Money spent against one category allocation.
//!
//! Expenses reach their budget and category only through `allocation_id`.
//! The `status` is informational: every expense counts toward spend totals.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status recorded on an expense
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ExpenseStatus {
    /// Confirmed expense
    #[sea_orm(string_value = "validated")]
    Validated,
    /// Expense awaiting confirmation
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Expense cancelled by the user
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ExpenseStatus {
    /// Lower-case label used in messages
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Validated => "validated",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Expense database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Allocation this expense is charged to
    pub allocation_id: i64,
    /// Human-readable description
    pub description: String,
    /// Amount spent, 2 decimal places
    pub amount: Decimal,
    /// Day the money was spent
    pub spent_on: Date,
    /// Lifecycle status
    pub status: ExpenseStatus,
    /// When the expense was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense belongs to one allocation
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
