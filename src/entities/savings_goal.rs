//! Savings goal entity - A target amount to save between two dates.
//!
//! `status` is derived from the owner's transactions on every read and
//! written back only when it changes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    /// Target not reached, deadline not passed
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    /// Net savings in the window reached the target
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    /// Deadline passed without reaching the target
    #[sea_orm(string_value = "OVERDUE")]
    Overdue,
}

/// Savings goal database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "savings_goals")]
pub struct Model {
    /// Unique identifier for the goal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable goal name
    pub name: String,
    /// Amount to save in cents, always positive
    #[serde(rename = "target_amount", with = "super::money::as_decimal")]
    pub target_amount_minor: i64,
    /// Last day of the progress window
    pub target_date: Date,
    /// First day of the progress window
    pub start_date: Date,
    /// Last derived status
    pub status: GoalStatus,
    /// Owning user
    pub owner_id: i64,
}

/// Defines relationships between `SavingsGoal` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each goal belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Model {
    /// The target amount with two decimals.
    #[must_use]
    pub fn target_amount(&self) -> Decimal {
        super::money::from_minor(self.target_amount_minor)
    }
}

impl ActiveModelBehavior for ActiveModel {}
