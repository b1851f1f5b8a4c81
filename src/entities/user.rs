//! User entity - Account that owns categories, transactions and goals.
//!
//! Credentials are verified by an external store; only the resulting hash
//! is kept here. `username` and `phone` are unique across all users.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login handle
    #[sea_orm(unique)]
    pub username: String,
    /// Hash produced by the credential store
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Contact phone number
    #[sea_orm(unique)]
    pub phone: String,
}

/// Defines relationships between User and the records it owns
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many categories
    #[sea_orm(has_many = "super::category::Entity")]
    Categories,
    /// One user owns many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One user owns many savings goals
    #[sea_orm(has_many = "super::savings_goal::Entity")]
    SavingsGoals,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::savings_goal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavingsGoals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
