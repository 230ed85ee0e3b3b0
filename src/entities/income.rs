//! Income entity - Money received into an account.
//!
//! Creating, editing or deleting an income adjusts the balance of its account.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How often an income recurs
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Periodicity {
    #[sea_orm(string_value = "once")]
    Once,
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

/// Income database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incomes")]
pub struct Model {
    /// Unique identifier for the income
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identity of the owning user
    pub user_id: String,
    /// Account credited by this income
    pub account_id: i64,
    /// Where the money comes from (e.g., "Salary")
    pub source: String,
    /// Amount received, 2 decimal places
    pub amount: Decimal,
    /// Day the money was received
    pub received_on: Date,
    /// Recurrence
    pub periodicity: Periodicity,
    /// When the income was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Income and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each income credits one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
