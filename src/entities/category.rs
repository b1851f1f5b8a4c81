//! Category entity - Income or expense bucket owned by a single user.
//!
//! Names are unique per owner, not globally. Default categories are seeded
//! once per user and are never edited or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether money flows in or out. Transactions copy this from their category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    /// Money received
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Money spent
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name, unique per owner (e.g., "Food", "Salary")
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Income or expense
    pub category_type: CategoryType,
    /// Seeded default categories are read-only
    pub is_default: bool,
    /// Owning user
    pub owner_id: i64,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each category belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    /// One category has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
