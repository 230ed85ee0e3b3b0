//! Account entity - A user's money account (bank, cash, savings...).
//!
//! The balance is credited by incomes recorded against the account and is
//! otherwise only changed by explicit edits.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identity of the owning user
    pub user_id: String,
    /// Display name (e.g., "Checking", "Cash")
    pub name: String,
    /// Current balance, 2 decimal places
    pub balance: Decimal,
    /// ISO 4217 currency code, upper-case
    pub currency: String,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account receives many incomes
    #[sea_orm(has_many = "super::income::Entity")]
    Incomes,
}

impl Related<super::income::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incomes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
