//! Category entity - A spending category such as "Food" or "Housing".
//!
//! Global categories have no `user_id` and are shared by every user; personal
//! categories belong to a single user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of a personal category, None for global categories
    pub user_id: Option<String>,
    /// Category name
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Optional icon key used by the presentation layer
    pub icon: Option<String>,
    /// Share of a budget this category receives by default (0-100)
    pub default_percentage: Decimal,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A category is allocated in many budgets
    #[sea_orm(has_many = "super::category_allocation::Entity")]
    Allocations,
    /// A category is targeted by many goals
    #[sea_orm(has_many = "super::goal::Entity")]
    Goals,
}

impl Related<super::category_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl Related<super::goal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this category is shared by all users.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.user_id.is_none()
    }
}
