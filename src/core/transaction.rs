//! Transaction business logic - the per-user ledger.
//!
//! This module provides functions for recording, listing, updating and deleting
//! transactions. A transaction's type is never supplied by the caller: it is
//! copied from the category it is filed under, both at creation and whenever
//! the category changes. Dates are fixed once recorded. Every query is scoped
//! to the current user's records.

use crate::{
    core::{
        category::get_category_by_name, clean_description, non_blank, today,
        user::CurrentUser, validate_amount,
    },
    entities::{Category, CategoryType, Transaction, category, transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Fields a caller may send when editing a transaction. `None` leaves the field as is.
///
/// `date` exists so a request that tries to move a transaction can be rejected
/// explicitly; any value there fails the whole update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionUpdate {
    /// New amount
    pub amount: Option<Decimal>,
    /// New description; an empty string clears it
    pub description: Option<String>,
    /// Name of the category to refile under
    pub category: Option<String>,
    /// Not editable
    pub date: Option<NaiveDate>,
}

/// A transaction's type is whatever its category says.
const fn derive_type(category: &category::Model) -> CategoryType {
    category.category_type
}

/// Aborts when a stored transaction disagrees with its category's type.
pub(crate) fn ensure_type_matches(
    transaction: &transaction::Model,
    category: &category::Model,
) -> Result<()> {
    if transaction.category_id != category.id
        || transaction.transaction_type != category.category_type
    {
        return Err(Error::Invariant {
            message: format!(
                "transaction {} does not carry the type of category {}",
                transaction.id, category.id
            ),
        });
    }
    Ok(())
}

fn owned_by(owner: &CurrentUser) -> Select<Transaction> {
    Transaction::find().filter(transaction::Column::OwnerId.eq(owner.id))
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::validation(format!(
            "start date {start} is after end date {end}"
        )));
    }
    Ok(())
}

async fn load_owned<C>(db: &C, owner: &CurrentUser, transaction_id: i64) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let found = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("transaction", transaction_id))?;

    if !owner.owns(found.owner_id) {
        return Err(Error::Forbidden {
            entity: "transaction",
            id: transaction_id,
        });
    }
    Ok(found)
}

/// Records a transaction against one of the owner's categories, looked up by name.
///
/// The amount must be positive with at most two decimals and the date cannot
/// be in the future.
#[instrument(skip(db, description))]
pub async fn create_transaction(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    amount: Decimal,
    date: NaiveDate,
    category_name: &str,
    description: Option<String>,
) -> Result<transaction::Model> {
    let amount = validate_amount("amount", amount)?;
    if date > today() {
        return Err(Error::validation(format!(
            "transaction date {date} is in the future"
        )));
    }
    let category_name = non_blank("category name", category_name)?;

    // Use a transaction so the category lookup and the insert see the same state
    let txn = db.begin().await?;

    let category = get_category_by_name(&txn, owner, &category_name)
        .await?
        .ok_or_else(|| Error::not_found("category", &category_name))?;

    let created = transaction::ActiveModel {
        amount_minor: Set(amount),
        date: Set(date),
        description: Set(clean_description(description)),
        transaction_type: Set(derive_type(&category)),
        category_id: Set(category.id),
        owner_id: Set(owner.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    ensure_type_matches(&created, &category)?;

    txn.commit().await?;
    info!(transaction_id = created.id, "Recorded transaction");
    Ok(created)
}

/// Fetches one of the owner's transactions.
pub async fn get_transaction(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    transaction_id: i64,
) -> Result<transaction::Model> {
    load_owned(db, owner, transaction_id).await
}

/// All of the owner's transactions in insertion order.
pub async fn list_transactions(
    db: &DatabaseConnection,
    owner: &CurrentUser,
) -> Result<Vec<transaction::Model>> {
    owned_by(owner)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All of the owner's transactions, newest date first.
pub async fn list_transactions_by_date_desc(
    db: &DatabaseConnection,
    owner: &CurrentUser,
) -> Result<Vec<transaction::Model>> {
    owned_by(owner)
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The owner's transactions dated within `[start, end]`, both ends inclusive.
pub async fn list_transactions_in_range(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<transaction::Model>> {
    check_range(start, end)?;
    owned_by(owner)
        .filter(transaction::Column::Date.between(start, end))
        .order_by_asc(transaction::Column::Date)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The owner's income or expense transactions.
pub async fn list_transactions_by_type(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    transaction_type: CategoryType,
) -> Result<Vec<transaction::Model>> {
    owned_by(owner)
        .filter(transaction::Column::TransactionType.eq(transaction_type))
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The owner's income or expense transactions dated within `[start, end]`.
pub async fn list_transactions_in_range_by_type(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    start: NaiveDate,
    end: NaiveDate,
    transaction_type: CategoryType,
) -> Result<Vec<transaction::Model>> {
    check_range(start, end)?;
    owned_by(owner)
        .filter(transaction::Column::Date.between(start, end))
        .filter(transaction::Column::TransactionType.eq(transaction_type))
        .order_by_asc(transaction::Column::Date)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The transactions filed under one of the owner's categories.
///
/// Fails with `Forbidden` when the category belongs to someone else.
pub async fn list_transactions_by_category(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    category_id: i64,
) -> Result<Vec<transaction::Model>> {
    let category = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("category", category_id))?;

    if !owner.owns(category.owner_id) {
        return Err(Error::Forbidden {
            entity: "category",
            id: category_id,
        });
    }

    owned_by(owner)
        .filter(transaction::Column::CategoryId.eq(category.id))
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial edit to one of the owner's transactions.
///
/// The request is all-or-nothing: every supplied field is checked before any
/// of them is written. Supplying a date fails with `Conflict`. Refiling under
/// another category re-derives the type from that category.
#[instrument(skip(db, changes))]
pub async fn update_transaction(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    transaction_id: i64,
    changes: TransactionUpdate,
) -> Result<transaction::Model> {
    if let Some(date) = changes.date {
        return Err(Error::conflict(format!(
            "transaction date cannot be changed (requested {date})"
        )));
    }
    let amount = changes
        .amount
        .map(|amount| validate_amount("amount", amount))
        .transpose()?;
    let category_name = changes
        .category
        .as_deref()
        .map(|name| non_blank("category name", name))
        .transpose()?;

    let txn = db.begin().await?;

    let existing = load_owned(&txn, owner, transaction_id).await?;

    let category = match category_name {
        Some(name) => get_category_by_name(&txn, owner, &name)
            .await?
            .ok_or_else(|| Error::not_found("category", &name))?,
        None => Category::find_by_id(existing.category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::Invariant {
                message: format!(
                    "transaction {transaction_id} references missing category {}",
                    existing.category_id
                ),
            })?,
    };

    let mut active: transaction::ActiveModel = existing.into();
    if let Some(amount) = amount {
        active.amount_minor = Set(amount);
    }
    if let Some(description) = changes.description {
        active.description = Set(clean_description(Some(description)));
    }
    active.category_id = Set(category.id);
    active.transaction_type = Set(derive_type(&category));

    let updated = active.update(&txn).await?;
    ensure_type_matches(&updated, &category)?;

    txn.commit().await?;
    info!(transaction_id, "Updated transaction");
    Ok(updated)
}

/// Permanently removes one of the owner's transactions.
#[instrument(skip(db))]
pub async fn delete_transaction(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    transaction_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;

    let existing = load_owned(&txn, owner, transaction_id).await?;
    existing.delete(&txn).await?;

    txn.commit().await?;
    debug!(transaction_id, "Deleted transaction");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::category::{create_category, list_categories};
    use crate::test_utils::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_transaction_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let owner = CurrentUser::new(1);

        // Zero, negative, sub-cent and unstorable amounts
        for amount in [
            dec!(0),
            dec!(-10.00),
            dec!(1.234),
            dec!(50000000000000000000000000000),
        ] {
            let result =
                create_transaction(&db, &owner, amount, today(), "Food", None).await;
            assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        }

        // Future date
        let tomorrow = today() + Duration::days(1);
        let result = create_transaction(&db, &owner, dec!(5), tomorrow, "Food", None).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_derives_type() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;

        let lunch = create_transaction(
            &db,
            &owner,
            dec!(12.50),
            today(),
            "Food",
            Some("lunch".to_string()),
        )
        .await?;
        assert_eq!(lunch.transaction_type, CategoryType::Expense);
        assert_eq!(lunch.amount(), dec!(12.50));
        assert_eq!(lunch.description.as_deref(), Some("lunch"));

        let pay = create_transaction(&db, &owner, dec!(2000), today(), "Salary", None).await?;
        assert_eq!(pay.transaction_type, CategoryType::Income);
        assert_eq!(pay.description, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_amounts_are_stored_exactly() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;

        let large = dec!(12345678901234567.89);
        let created = create_transaction(&db, &owner, large, today(), "Salary", None).await?;
        assert_eq!(created.amount(), large);

        let fetched = get_transaction(&db, &owner, created.id).await?;
        assert_eq!(fetched.amount(), large);
        assert_eq!(fetched.amount().to_string(), "12345678901234567.89");

        let round = create_transaction(&db, &owner, dec!(100.00), today(), "Food", None).await?;
        let fetched = get_transaction(&db, &owner, round.id).await?;
        assert_eq!(fetched.amount().to_string(), "100.00");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_unknown_category() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;
        let other = create_test_user(&db, "bob").await?;
        create_category(&db, &other, "Books", None, CategoryType::Expense).await?;

        let result = create_transaction(&db, &owner, dec!(5), today(), "Books", None).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_queries_are_owner_scoped() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;
        let other = create_test_user(&db, "bob").await?;
        list_categories(&db, &other).await?;

        let day = |offset| today() - Duration::days(offset);
        let old = create_transaction(&db, &owner, dec!(10), day(10), "Food", None).await?;
        let pay = create_transaction(&db, &owner, dec!(500), day(5), "Salary", None).await?;
        let recent = create_transaction(&db, &owner, dec!(20), day(1), "Rent", None).await?;
        create_transaction(&db, &other, dec!(99), day(5), "Food", None).await?;

        let all = list_transactions(&db, &owner).await?;
        assert_eq!(all, vec![old.clone(), pay.clone(), recent.clone()]);

        let newest_first = list_transactions_by_date_desc(&db, &owner).await?;
        assert_eq!(newest_first, vec![recent.clone(), pay.clone(), old.clone()]);

        let window = list_transactions_in_range(&db, &owner, day(5), day(1)).await?;
        assert_eq!(window, vec![pay.clone(), recent.clone()]);

        let expenses = list_transactions_by_type(&db, &owner, CategoryType::Expense).await?;
        assert_eq!(expenses, vec![old.clone(), recent.clone()]);

        let window_expenses = list_transactions_in_range_by_type(
            &db,
            &owner,
            day(6),
            day(0),
            CategoryType::Expense,
        )
        .await?;
        assert_eq!(window_expenses, vec![recent]);

        let bad_range = list_transactions_in_range(&db, &owner, day(0), day(3)).await;
        assert!(matches!(bad_range.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_transactions_by_category() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;
        let other = create_test_user(&db, "bob").await?;
        let theirs = create_category(&db, &other, "Books", None, CategoryType::Expense).await?;

        let lunch = create_test_transaction(&db, &owner, "Food", dec!(8)).await?;
        create_test_transaction(&db, &owner, "Rent", dec!(800)).await?;

        let food = list_transactions_by_category(&db, &owner, lunch.category_id).await?;
        assert_eq!(food, vec![lunch]);

        let foreign = list_transactions_by_category(&db, &owner, theirs.id).await;
        assert!(matches!(foreign.unwrap_err(), Error::Forbidden { .. }));

        let missing = list_transactions_by_category(&db, &owner, 9999).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_transaction_rederives_type() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;
        let original = create_test_transaction(&db, &owner, "Food", dec!(40)).await?;

        let updated = update_transaction(
            &db,
            &owner,
            original.id,
            TransactionUpdate {
                category: Some("Salary".to_string()),
                ..Default::default()
            },
        )
        .await?;

        let salary = get_category_by_name(&db, &owner, "Salary").await?.unwrap();
        assert_eq!(updated.category_id, salary.id);
        assert_eq!(updated.transaction_type, CategoryType::Income);
        assert_eq!(updated.amount(), original.amount());
        assert_eq!(updated.date, original.date);
        assert_eq!(updated.description, original.description);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_transaction_partial_fields() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;
        let original = create_test_transaction(&db, &owner, "Food", dec!(40)).await?;

        let updated = update_transaction(
            &db,
            &owner,
            original.id,
            TransactionUpdate {
                amount: Some(dec!(42.75)),
                description: Some("groceries".to_string()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.amount(), dec!(42.75));
        assert_eq!(updated.description.as_deref(), Some("groceries"));
        assert_eq!(updated.category_id, original.category_id);
        assert_eq!(updated.transaction_type, CategoryType::Expense);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_transaction_date_rejected_atomically() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;
        let original = create_test_transaction(&db, &owner, "Food", dec!(40)).await?;

        let result = update_transaction(
            &db,
            &owner,
            original.id,
            TransactionUpdate {
                amount: Some(dec!(1)),
                category: Some("Salary".to_string()),
                date: Some(original.date - Duration::days(1)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));

        let unchanged = get_transaction(&db, &owner, original.id).await?;
        assert_eq!(unchanged, original);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_transaction_rejections() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;
        let other = create_test_user(&db, "bob").await?;
        let original = create_test_transaction(&db, &owner, "Food", dec!(40)).await?;

        let foreign = update_transaction(
            &db,
            &other,
            original.id,
            TransactionUpdate {
                amount: Some(dec!(1)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(foreign.unwrap_err(), Error::Forbidden { .. }));

        let missing = update_transaction(&db, &owner, 9999, TransactionUpdate::default()).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));

        let bad_amount = update_transaction(
            &db,
            &owner,
            original.id,
            TransactionUpdate {
                amount: Some(dec!(-3)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(bad_amount.unwrap_err(), Error::Validation { .. }));

        let unknown_category = update_transaction(
            &db,
            &owner,
            original.id,
            TransactionUpdate {
                amount: Some(dec!(3)),
                category: Some("Nope".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(unknown_category.unwrap_err(), Error::NotFound { .. }));
        assert_eq!(get_transaction(&db, &owner, original.id).await?, original);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_transaction() -> Result<()> {
        let (db, owner) = setup_with_defaults().await?;
        let other = create_test_user(&db, "bob").await?;
        let original = create_test_transaction(&db, &owner, "Food", dec!(40)).await?;

        let foreign = delete_transaction(&db, &other, original.id).await;
        assert!(matches!(foreign.unwrap_err(), Error::Forbidden { .. }));

        delete_transaction(&db, &owner, original.id).await?;
        let gone = get_transaction(&db, &owner, original.id).await;
        assert!(matches!(gone.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }
}
