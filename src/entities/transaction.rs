//! Transaction entity - A dated income or expense recorded against a category.
//!
//! `transaction_type` is always copied from the category at creation or
//! recategorization time and is never set independently. `date` is
//! immutable once the record exists.
use super::category::CategoryType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Positive amount in cents, exposed as a two-decimal `amount`
    #[serde(rename = "amount", with = "super::money::as_decimal")]
    pub amount_minor: i64,
    /// Day the money moved (never in the future)
    pub date: Date,
    /// Optional free-text description
    pub description: Option<String>,
    /// Derived from the category: `INCOME` or `EXPENSE`
    pub transaction_type: CategoryType,
    /// Category this transaction is filed under
    pub category_id: i64,
    /// Owning user
    pub owner_id: i64,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Each transaction belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Model {
    /// The amount with two decimals.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        super::money::from_minor(self.amount_minor)
    }
}

impl ActiveModelBehavior for ActiveModel {}
