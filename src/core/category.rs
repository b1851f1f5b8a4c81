//! Category business logic - the per-user category registry.
//!
//! Categories are looked up by the composite key (owner, name). A user's first
//! listing seeds the fixed default set; defaults are read-only afterwards.
//! A category that transactions still reference cannot be deleted, and its
//! type cannot change, since transactions copy their type from it.

use crate::{
    core::{clean_description, non_blank, user::CurrentUser},
    entities::{Category, CategoryType, Transaction, category, transaction},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Categories every user starts with. Created verbatim, all marked default.
pub const DEFAULT_CATEGORIES: [(&str, CategoryType); 7] = [
    ("Salary", CategoryType::Income),
    ("Food", CategoryType::Expense),
    ("Rent", CategoryType::Expense),
    ("Transportation", CategoryType::Expense),
    ("Entertainment", CategoryType::Expense),
    ("Healthcare", CategoryType::Expense),
    ("Utilities", CategoryType::Expense),
];

/// Finds one of the owner's categories by name.
pub async fn get_category_by_name<C>(
    db: &C,
    owner: &CurrentUser,
    name: &str,
) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::OwnerId.eq(owner.id))
        .filter(category::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn is_in_use<C>(db: &C, category_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let references = Transaction::find()
        .filter(transaction::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    Ok(references > 0)
}

async fn seed_default_categories<C>(db: &C, owner: &CurrentUser) -> Result<()>
where
    C: ConnectionTrait,
{
    let defaults = DEFAULT_CATEGORIES
        .iter()
        .map(|(name, category_type)| category::ActiveModel {
            name: Set((*name).to_string()),
            description: Set(None),
            category_type: Set(*category_type),
            is_default: Set(true),
            owner_id: Set(owner.id),
            ..Default::default()
        });

    Category::insert_many(defaults).exec(db).await?;
    info!(owner_id = owner.id, "Seeded default categories");
    Ok(())
}

/// Creates a custom (non-default) category.
///
/// Fails with `Conflict` if the owner already has a category with this name.
#[instrument(skip(db, description))]
pub async fn create_category(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    name: &str,
    description: Option<String>,
    category_type: CategoryType,
) -> Result<category::Model> {
    let name = non_blank("category name", name)?;

    let txn = db.begin().await?;

    if get_category_by_name(&txn, owner, &name).await?.is_some() {
        return Err(Error::conflict(format!("category '{name}' already exists")));
    }

    let created = category::ActiveModel {
        name: Set(name),
        description: Set(clean_description(description)),
        category_type: Set(category_type),
        is_default: Set(false),
        owner_id: Set(owner.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(category_id = created.id, "Created category");
    Ok(created)
}

/// Lists all of the owner's categories, seeding the defaults when there are none.
pub async fn list_categories(
    db: &DatabaseConnection,
    owner: &CurrentUser,
) -> Result<Vec<category::Model>> {
    let txn = db.begin().await?;

    let existing = Category::find()
        .filter(category::Column::OwnerId.eq(owner.id))
        .count(&txn)
        .await?;
    if existing == 0 {
        seed_default_categories(&txn, owner).await?;
    }

    let categories = Category::find()
        .filter(category::Column::OwnerId.eq(owner.id))
        .order_by_asc(category::Column::Id)
        .all(&txn)
        .await?;

    txn.commit().await?;
    debug!(owner_id = owner.id, count = categories.len(), "Listed categories");
    Ok(categories)
}

/// Replaces the name, description and type of a custom category.
///
/// Renaming a category to its own name is allowed. Changing the type of a
/// category that transactions reference is rejected with `Conflict`.
#[instrument(skip(db, description))]
pub async fn update_category(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    category_id: i64,
    name: &str,
    description: Option<String>,
    category_type: CategoryType,
) -> Result<category::Model> {
    let name = non_blank("category name", name)?;

    let txn = db.begin().await?;

    let existing = Category::find_by_id(category_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("category", category_id))?;

    if !owner.owns(existing.owner_id) {
        return Err(Error::Forbidden {
            entity: "category",
            id: category_id,
        });
    }

    if existing.is_default {
        return Err(Error::conflict(format!(
            "default category '{}' cannot be modified",
            existing.name
        )));
    }

    if let Some(clash) = get_category_by_name(&txn, owner, &name).await? {
        if clash.id != category_id {
            return Err(Error::conflict(format!("category '{name}' already exists")));
        }
    }

    if category_type != existing.category_type && is_in_use(&txn, category_id).await? {
        return Err(Error::conflict(format!(
            "category '{}' is used by transactions; its type cannot change",
            existing.name
        )));
    }

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(name);
    active.description = Set(clean_description(description));
    active.category_type = Set(category_type);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    info!(category_id, "Updated category");
    Ok(updated)
}

/// Deletes a custom category by name.
///
/// Fails with `Conflict` for default categories and for categories that any
/// transaction still references.
#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, owner: &CurrentUser, name: &str) -> Result<()> {
    let txn = db.begin().await?;

    let existing = get_category_by_name(&txn, owner, name)
        .await?
        .ok_or_else(|| Error::not_found("category", name.trim()))?;

    if existing.is_default {
        return Err(Error::conflict(format!(
            "default category '{}' cannot be deleted",
            existing.name
        )));
    }

    if is_in_use(&txn, existing.id).await? {
        return Err(Error::conflict(format!(
            "category '{}' is used by transactions",
            existing.name
        )));
    }

    let category_id = existing.id;
    existing.delete(&txn).await?;

    txn.commit().await?;
    info!(category_id, "Deleted category");
    Ok(())
}
