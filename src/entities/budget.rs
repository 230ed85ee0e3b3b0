//! Budget entity - A total amount to spend over a closed date range.
//!
//! The total is split across categories through `category_allocation` rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identity of the owning user
    pub user_id: String,
    /// Budget name (e.g., "Budget May 2025")
    pub name: String,
    /// First day covered by the budget (inclusive)
    pub start_date: Date,
    /// Last day covered by the budget (inclusive)
    pub end_date: Date,
    /// Total amount to distribute across categories
    pub total_amount: Decimal,
    /// When the budget was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One budget has many category allocations
    #[sea_orm(has_many = "super::category_allocation::Entity")]
    Allocations,
}

impl Related<super::category_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether `day` falls inside the budget's date range.
    #[must_use]
    pub fn covers(&self, day: Date) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}
