//! Goal entity - A spending target for one category over a date window.
//!
//! Progress is derived from expenses on read; only the status is stored.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Goal lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum GoalStatus {
    /// Goal is being tracked
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Target amount was reached
    #[sea_orm(string_value = "achieved")]
    Achieved,
    /// User gave up on the goal
    #[sea_orm(string_value = "abandoned")]
    Abandoned,
    /// End date passed before the target was reached
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl GoalStatus {
    /// Terminal statuses freeze the goal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// Lower-case label used in messages
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InProgress => "in progress",
            Self::Achieved => "achieved",
            Self::Abandoned => "abandoned",
            Self::Failed => "failed",
        }
    }
}

/// Goal database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    /// Unique identifier for the goal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identity of the owning user
    pub user_id: String,
    /// Category whose expenses count toward the goal
    pub category_id: i64,
    /// Short title
    pub title: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Amount to reach
    pub target_amount: Decimal,
    /// First day of the goal window
    pub start_date: Date,
    /// Last day of the goal window
    pub end_date: Date,
    /// Current status
    pub status: GoalStatus,
    /// When the goal was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Goal and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each goal targets one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
