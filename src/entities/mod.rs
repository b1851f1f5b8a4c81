//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod money;
pub mod savings_goal;
pub mod transaction;
pub mod user;

// Re-export specific types to avoid conflicts
pub use category::{
    CategoryType, Column as CategoryColumn, Entity as Category, Model as CategoryModel,
};
pub use savings_goal::{
    Column as SavingsGoalColumn, Entity as SavingsGoal, GoalStatus, Model as SavingsGoalModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
