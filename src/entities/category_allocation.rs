//! Category allocation entity - The share of a budget given to one category.
//!
//! `allocated_amount` and `percentage` are both stored. They are kept in sync by
//! the allocation rules in `core::allocation`, not by a database constraint.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category allocation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_allocations")]
pub struct Model {
    /// Unique identifier for the allocation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Budget this allocation belongs to
    pub budget_id: i64,
    /// Category receiving the allocation
    pub category_id: i64,
    /// Allocated amount, 2 decimal places
    pub allocated_amount: Decimal,
    /// Share of the budget total (0-100), 2 decimal places
    pub percentage: Decimal,
}

/// Defines relationships between `CategoryAllocation` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each allocation belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
    /// Each allocation targets one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// One allocation has many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
    /// One allocation is watched by many alerts
    #[sea_orm(has_many = "super::alert::Entity")]
    Alerts,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::alert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alerts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
