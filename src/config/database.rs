//! Database configuration module for `BudgetKeeper`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the database schema always matches the Rust structs. The (owner, name) uniqueness of
//! categories is a composite constraint and gets its own index.

use crate::entities::{Category, SavingsGoal, Transaction, User, category};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema, sea_query::Index};
use tracing::{debug, info};

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables in foreign-key order, then the composite category index.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let user_table = schema.create_table_from_entity(User);
    let category_table = schema.create_table_from_entity(Category);
    let transaction_table = schema.create_table_from_entity(Transaction);
    let goal_table = schema.create_table_from_entity(SavingsGoal);

    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&category_table)).await?;
    db.execute(builder.build(&transaction_table)).await?;
    db.execute(builder.build(&goal_table)).await?;

    let owner_name_index = Index::create()
        .name("idx_categories_owner_name")
        .table(Category)
        .col(category::Column::OwnerId)
        .col(category::Column::Name)
        .unique()
        .to_owned();
    db.execute(builder.build(&owner_name_index)).await?;

    info!("Database schema created");
    Ok(())
}

/// Creates the schema unless the `users` table already exists.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    let existing = db
        .query_one(sea_orm::Statement::from_string(
            db.get_database_backend(),
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'users'",
        ))
        .await?;

    if existing.is_some() {
        debug!("Schema already present");
        return Ok(());
    }
    create_tables(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        CategoryModel, SavingsGoalModel, TransactionModel, UserModel, category::CategoryType,
    };
    use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<CategoryModel> = Category::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;
        let _: Vec<SavingsGoalModel> = SavingsGoal::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        ensure_schema(&db).await?;
        ensure_schema(&db).await?;

        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_owner_name_index_rejects_duplicates() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        let owner = crate::entities::user::ActiveModel {
            name: Set("Ann".to_string()),
            username: Set("ann".to_string()),
            password_hash: Set("hash".to_string()),
            phone: Set("555-0100".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let food = || category::ActiveModel {
            name: Set("Food".to_string()),
            description: Set(None),
            category_type: Set(CategoryType::Expense),
            is_default: Set(false),
            owner_id: Set(owner.id),
            ..Default::default()
        };

        food().insert(&db).await?;
        assert!(food().insert(&db).await.is_err());

        Ok(())
    }
}
