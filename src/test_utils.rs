//! Shared test utilities for `BudgetKeeper`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{category, today, transaction, user},
    entities,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers a user with placeholder credentials and returns its identity.
///
/// # Defaults
/// * `name`: same as `username`
/// * `password_hash`: `"test-hash"`
/// * `phone`: derived from `username` so it stays unique
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> Result<user::CurrentUser> {
    let created = user::register_user(
        db,
        username,
        username,
        "test-hash",
        &format!("phone-{username}"),
    )
    .await?;
    Ok(user::CurrentUser::new(created.id))
}

/// Sets up a database with a single user.
/// Returns (db, user) for common test scenarios.
pub async fn setup_with_user() -> Result<(DatabaseConnection, user::CurrentUser)> {
    let db = setup_test_db().await?;
    let owner = create_test_user(&db, "alice").await?;
    Ok((db, owner))
}

/// Sets up a database with a single user whose default categories are seeded.
pub async fn setup_with_defaults() -> Result<(DatabaseConnection, user::CurrentUser)> {
    let (db, owner) = setup_with_user().await?;
    category::list_categories(&db, &owner).await?;
    Ok((db, owner))
}

/// Records a transaction dated today with sensible defaults.
///
/// # Defaults
/// * `date`: today
/// * `description`: `"Test transaction"`
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    owner: &user::CurrentUser,
    category_name: &str,
    amount: Decimal,
) -> Result<entities::transaction::Model> {
    transaction::create_transaction(
        db,
        owner,
        amount,
        today(),
        category_name,
        Some("Test transaction".to_string()),
    )
    .await
}
